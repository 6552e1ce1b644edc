// handlers/public/sign_up.rs - POST /sign_up handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::database::UserFullInfo;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /sign_up - create an account with role `default`
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult<UserFullInfo> {
    let Json(body) = payload?;
    let info = state.accounts.sign_up(&body.name, &body.email, &body.password).await?;
    Ok(ApiResponse::created(info))
}
