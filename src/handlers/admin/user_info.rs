// handlers/admin/user_info.rs - GET /admin/get_user_info?user_id=

use axum::extract::{rejection::QueryRejection, Query, State};
use std::sync::Arc;

use crate::app::AppState;
use crate::database::UserFullInfo;
use crate::handlers::protected::UserIdQuery;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn get_user_info(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> ApiResult<UserFullInfo> {
    let Query(query) = query?;
    let info = state.accounts.admin_user_info(&query.user_id).await?;
    Ok(ApiResponse::success(info))
}
