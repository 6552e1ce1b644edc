// handlers/public/sign_in.rs - POST /sign_in handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SignInResult;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// POST /sign_in - verify credentials and issue a bearer token
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<SignInResult> {
    let Json(body) = payload?;
    let session = state.accounts.sign_in(&body.email, &body.password).await?;
    tracing::info!(user = %session.user_id, "signed in");
    Ok(ApiResponse::success(session))
}
