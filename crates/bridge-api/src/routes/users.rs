//! 그룹별 계정 목록 endpoint.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use bridge_core::UserRecord;
use bridge_gateway::catalog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{bridge_error_response, ApiResult};
use crate::state::AppState;

fn default_group_mask() -> String {
    "*".to_string()
}

/// 계정 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct UsersParams {
    /// 그룹 마스크 (기본: 전체)
    #[serde(default = "default_group_mask")]
    pub group: String,
}

/// 계정 목록 응답.
#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    /// 계정 수
    pub count: usize,
    /// 계정 목록
    pub users: Vec<UserRecord>,
}

/// 그룹 마스크로 계정 목록을 조회합니다.
///
/// GET /api/v1/users/{identifier}?group=mask
pub async fn list_users(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<UsersParams>,
) -> ApiResult<Json<UsersListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let users = catalog::users_by_group(&session, &params.group)
        .await
        .map_err(bridge_error_response)?;

    Ok(Json(UsersListResponse {
        count: users.len(),
        users,
    }))
}

/// 계정 조회 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new().route("/{identifier}", get(list_users))
}
