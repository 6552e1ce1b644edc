// handlers/admin/password.rs - POST /admin/change_password

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Caller};

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub user_id: String,
    pub password: String,
}

/// Sets a new password for any user and emails it to them
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(body) = payload?;
    state
        .accounts
        .admin_reset_password(&caller, &body.user_id, &body.password)
        .await?;
    Ok(ApiResponse::empty())
}
