// handlers/protected/user_info.rs - GET /get_user_info and GET /v2/get_user_info

use axum::extract::{rejection::QueryRejection, Query, State};
use std::sync::Arc;

use super::UserIdQuery;
use crate::app::AppState;
use crate::database::UserFullInfo;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::services::UserView;

/// GET /get_user_info - the caller's own record
pub async fn get_user_info(Caller(caller): Caller) -> ApiResult<UserFullInfo> {
    Ok(ApiResponse::success(caller.full_info()))
}

/// GET /v2/get_user_info?user_id= - any user; full info for admins and for
/// the caller's own record, name only otherwise
pub async fn get_user_info_v2(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> ApiResult<UserView> {
    let Query(query) = query?;
    let view = state.accounts.user_info_for(&caller, &query.user_id).await?;
    Ok(ApiResponse::success(view))
}
