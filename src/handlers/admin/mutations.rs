// handlers/admin/mutations.rs - block state and role changes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Caller};

#[derive(Debug, Deserialize)]
pub struct BlockUserRequest {
    pub user_id: String,
    pub block: bool,
}

/// Role arrives as a raw string so unknown values surface as invalid input
/// in the envelope rather than a deserialization failure
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub user_id: String,
    pub role: String,
}

/// POST /admin/block_user - block or unblock a user
pub async fn block_user(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<BlockUserRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(body) = payload?;
    state.mutations.set_blocked(caller.id, &body.user_id, body.block).await?;
    Ok(ApiResponse::empty())
}

/// POST /admin/set_role_to_user - set a user's role to `default` or `admin`
pub async fn set_role_to_user(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<SetRoleRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(body) = payload?;
    state.mutations.set_role(caller.id, &body.user_id, &body.role).await?;
    Ok(ApiResponse::empty())
}
