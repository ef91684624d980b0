//! 매니저/터미널 심볼 매핑 endpoint.
//!
//! 매핑은 (manager_id, terminal_id) 키 단위로 조회/교체됩니다.
//! 교체는 전체 치환이며 부분 갱신은 없습니다.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use bridge_data::SymbolMappingRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{bridge_error_response, db_not_configured, ApiResult};
use crate::state::AppState;

/// 매핑 키 파라미터.
#[derive(Debug, Deserialize)]
pub struct MappingKey {
    /// 매니저 식별자
    pub manager_id: String,
    /// 터미널 식별자
    pub terminal_id: String,
}

/// 매핑 목록 응답.
#[derive(Debug, Serialize)]
pub struct MappingsListResponse {
    /// 매핑 수
    pub count: usize,
    /// 매핑 목록
    pub mappings: Vec<SymbolMappingRecord>,
}

/// 심볼 쌍.
#[derive(Debug, Serialize, Deserialize)]
pub struct MappingPair {
    /// 매니저 쪽 심볼
    pub manager_symbol: String,
    /// 터미널 쪽 심볼
    pub terminal_symbol: String,
}

/// 매핑 교체 요청.
#[derive(Debug, Deserialize)]
pub struct ReplaceMappingsRequest {
    pub manager_id: String,
    pub terminal_id: String,
    /// 키의 새 매핑 전체
    pub pairs: Vec<MappingPair>,
}

/// 매핑 교체 응답.
#[derive(Debug, Serialize)]
pub struct ReplaceMappingsResponse {
    /// 교체 후 매핑 수
    pub replaced: usize,
}

/// 키의 매핑 목록을 조회합니다.
///
/// GET /api/v1/mappings?manager_id=..&terminal_id=..
pub async fn list_mappings(
    State(state): State<Arc<AppState>>,
    Query(key): Query<MappingKey>,
) -> ApiResult<Json<MappingsListResponse>> {
    let repo = state.mappings.as_ref().ok_or_else(db_not_configured)?;
    let mappings = repo
        .list(&key.manager_id, &key.terminal_id)
        .await
        .map_err(|error| bridge_error_response(error.into()))?;

    Ok(Json(MappingsListResponse {
        count: mappings.len(),
        mappings,
    }))
}

/// 키의 매핑을 통째로 교체합니다.
///
/// PUT /api/v1/mappings
pub async fn replace_mappings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReplaceMappingsRequest>,
) -> ApiResult<Json<ReplaceMappingsResponse>> {
    let repo = state.mappings.as_ref().ok_or_else(db_not_configured)?;

    let pairs: Vec<(String, String)> = request
        .pairs
        .into_iter()
        .map(|pair| (pair.manager_symbol, pair.terminal_symbol))
        .collect();

    repo.replace(&request.manager_id, &request.terminal_id, &pairs)
        .await
        .map_err(|error| bridge_error_response(error.into()))?;

    Ok(Json(ReplaceMappingsResponse {
        replaced: pairs.len(),
    }))
}

/// 심볼 매핑 라우터 생성.
pub fn mappings_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_mappings).put(replace_mappings))
}
