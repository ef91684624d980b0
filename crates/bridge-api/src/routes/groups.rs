//! 그룹 설정 카탈로그 endpoint.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bridge_core::GroupSnapshot;
use bridge_gateway::catalog;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{bridge_error_response, ApiResult};
use crate::state::AppState;

/// 그룹 설정 목록 응답.
#[derive(Debug, Serialize)]
pub struct GroupsListResponse {
    /// 그룹 수
    pub count: usize,
    /// 그룹 설정 목록
    pub groups: Vec<GroupSnapshot>,
}

/// 전체 그룹 설정을 조회합니다 (수수료 구간 정렬 포함).
///
/// GET /api/v1/groups/{identifier}
pub async fn list_groups(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<GroupsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let groups = catalog::group_configurations(&session)
        .await
        .map_err(bridge_error_response)?;

    Ok(Json(GroupsListResponse {
        count: groups.len(),
        groups,
    }))
}

/// 그룹 카탈로그 라우터 생성.
pub fn groups_router() -> Router<Arc<AppState>> {
    Router::new().route("/{identifier}", get(list_groups))
}
