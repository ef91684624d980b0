//! 심볼 설정 카탈로그 endpoint.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bridge_core::SymbolInfo;
use bridge_gateway::catalog;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{bridge_error_response, ApiResult};
use crate::state::AppState;

/// 심볼 설정 목록 응답.
#[derive(Debug, Serialize)]
pub struct SymbolsListResponse {
    /// 심볼 수
    pub count: usize,
    /// 심볼 설정 목록
    pub symbols: Vec<SymbolInfo>,
}

/// 전체 심볼 설정을 조회합니다.
///
/// GET /api/v1/symbols/{identifier}
pub async fn list_symbols(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SymbolsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let symbols = catalog::symbol_configurations(&session)
        .await
        .map_err(bridge_error_response)?;

    Ok(Json(SymbolsListResponse {
        count: symbols.len(),
        symbols,
    }))
}

/// 심볼 카탈로그 라우터 생성.
pub fn symbols_router() -> Router<Arc<AppState>> {
    Router::new().route("/{identifier}", get(list_symbols))
}
