//! 오픈 포지션 스냅샷 endpoint.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bridge_core::Position;
use bridge_gateway::catalog;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{bridge_error_response, ApiResult};
use crate::state::AppState;

/// 포지션 목록 응답.
#[derive(Debug, Serialize)]
pub struct PositionsListResponse {
    /// 포지션 수
    pub count: usize,
    /// 포지션 목록
    pub positions: Vec<Position>,
}

/// 현재 오픈 포지션 스냅샷을 조회합니다.
///
/// GET /api/v1/positions/{identifier}/latest
pub async fn latest_positions(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PositionsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let positions = catalog::latest_positions(&session)
        .await
        .map_err(bridge_error_response)?;

    Ok(Json(PositionsListResponse {
        count: positions.len(),
        positions,
    }))
}

/// 포지션 조회 라우터 생성.
pub fn positions_router() -> Router<Arc<AppState>> {
    Router::new().route("/{identifier}/latest", get(latest_positions))
}
