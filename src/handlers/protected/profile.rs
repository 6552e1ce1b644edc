// handlers/protected/profile.rs - self-service account changes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Caller};

#[derive(Debug, Deserialize)]
pub struct SetUserInfoRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// POST /set_user_info - rename the caller
pub async fn set_user_info(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<SetUserInfoRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(body) = payload?;
    state.accounts.rename(&caller, &body.name).await?;
    Ok(ApiResponse::empty())
}

/// POST /change_psw - change the caller's own password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(body) = payload?;
    state.accounts.change_password(&caller, &body.password).await?;
    Ok(ApiResponse::empty())
}
