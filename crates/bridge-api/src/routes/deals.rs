//! 체결 조회 endpoint.
//!
//! 라이브 버퍼 드레인과 과거 체결 퍼사드의 여섯 가지 조회 형태를
//! 노출합니다. 기간 필터는 `days` 룩백(기본 100일)으로 받습니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bridge_core::{BridgeError, Deal};
use bridge_gateway::history;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{bridge_error_response, ApiErrorResponse, ApiResult};
use crate::state::AppState;

fn default_days() -> i64 {
    100
}

fn default_page_total() -> u32 {
    100
}

/// 체결 목록 응답.
#[derive(Debug, Serialize)]
pub struct DealsListResponse {
    /// 체결 수
    pub count: usize,
    /// 체결 목록
    pub deals: Vec<Deal>,
}

impl From<Vec<Deal>> for DealsListResponse {
    fn from(deals: Vec<Deal>) -> Self {
        Self {
            count: deals.len(),
            deals,
        }
    }
}

/// 그룹 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct GroupParams {
    /// 그룹 마스크 (쉼표 구분, `*` 와일드카드)
    pub groups: String,
    /// 룩백 일수
    #[serde(default = "default_days")]
    pub days: i64,
}

/// 그룹 + 심볼 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct GroupSymbolParams {
    pub groups: String,
    pub symbol: String,
    #[serde(default = "default_days")]
    pub days: i64,
}

/// 로그인 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct LoginsParams {
    /// 로그인 목록 (쉼표 구분)
    pub logins: String,
    #[serde(default = "default_days")]
    pub days: i64,
}

/// 로그인 + 심볼 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct LoginsSymbolParams {
    pub logins: String,
    pub symbol: String,
    #[serde(default = "default_days")]
    pub days: i64,
}

/// 티켓 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct TicketsParams {
    /// 티켓 목록 (쉼표 구분)
    pub tickets: String,
}

/// 페이지 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    /// 단일 로그인
    pub login: u64,
    #[serde(default = "default_days")]
    pub days: i64,
    /// 페이지 시작 오프셋
    #[serde(default)]
    pub offset: u32,
    /// 페이지 크기
    #[serde(default = "default_page_total")]
    pub total: u32,
}

fn lookback_window(
    days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), (StatusCode, Json<ApiErrorResponse>)> {
    if days <= 0 {
        return Err(bridge_error_response(BridgeError::ValidationFailure(
            "days must be positive".to_string(),
        )));
    }
    let to = Utc::now();
    Ok((to - Duration::days(days), to))
}

/// 라이브 버퍼에 쌓인 체결을 한 번 비워 반환합니다.
///
/// GET /api/v1/deals/{identifier}/latest
pub async fn latest_deals(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DealsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let deals = session.latest_deals().await.map_err(bridge_error_response)?;
    Ok(Json(deals.into()))
}

/// 그룹 마스크로 과거 체결을 조회합니다.
///
/// GET /api/v1/deals/{identifier}/by-group
pub async fn deals_by_group(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<GroupParams>,
) -> ApiResult<Json<DealsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let (from, to) = lookback_window(params.days)?;
    let deals = history::deals_by_group(&session, &params.groups, from, to)
        .await
        .map_err(bridge_error_response)?;
    Ok(Json(deals.into()))
}

/// 그룹 마스크 + 심볼로 과거 체결을 조회합니다.
///
/// GET /api/v1/deals/{identifier}/by-group-symbol
pub async fn deals_by_group_symbol(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<GroupSymbolParams>,
) -> ApiResult<Json<DealsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let (from, to) = lookback_window(params.days)?;
    let deals =
        history::deals_by_group_symbol(&session, &params.groups, &params.symbol, from, to)
            .await
            .map_err(bridge_error_response)?;
    Ok(Json(deals.into()))
}

/// 로그인 목록으로 과거 체결을 조회합니다.
///
/// GET /api/v1/deals/{identifier}/by-logins
pub async fn deals_by_logins(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoginsParams>,
) -> ApiResult<Json<DealsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let (from, to) = lookback_window(params.days)?;
    let deals = history::deals_by_logins(&session, &params.logins, from, to)
        .await
        .map_err(bridge_error_response)?;
    Ok(Json(deals.into()))
}

/// 로그인 목록 + 심볼로 과거 체결을 조회합니다.
///
/// GET /api/v1/deals/{identifier}/by-logins-symbol
pub async fn deals_by_logins_symbol(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoginsSymbolParams>,
) -> ApiResult<Json<DealsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let (from, to) = lookback_window(params.days)?;
    let deals =
        history::deals_by_logins_symbol(&session, &params.logins, &params.symbol, from, to)
            .await
            .map_err(bridge_error_response)?;
    Ok(Json(deals.into()))
}

/// 티켓 목록으로 체결을 조회합니다 (기간 없음).
///
/// GET /api/v1/deals/{identifier}/by-tickets
pub async fn deals_by_tickets(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TicketsParams>,
) -> ApiResult<Json<DealsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let deals = history::deals_by_tickets(&session, &params.tickets)
        .await
        .map_err(bridge_error_response)?;
    Ok(Json(deals.into()))
}

/// 단일 로그인의 체결을 페이지 단위로 조회합니다.
///
/// GET /api/v1/deals/{identifier}/page
pub async fn deals_page(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<DealsListResponse>> {
    let session = state.registry.get(&identifier).map_err(bridge_error_response)?;
    let (from, to) = lookback_window(params.days)?;
    let deals = history::deals_page(
        &session,
        params.login,
        from,
        to,
        params.offset,
        params.total,
    )
    .await
    .map_err(bridge_error_response)?;
    Ok(Json(deals.into()))
}

/// 체결 조회 라우터 생성.
pub fn deals_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{identifier}/latest", get(latest_deals))
        .route("/{identifier}/by-group", get(deals_by_group))
        .route("/{identifier}/by-group-symbol", get(deals_by_group_symbol))
        .route("/{identifier}/by-logins", get(deals_by_logins))
        .route("/{identifier}/by-logins-symbol", get(deals_by_logins_symbol))
        .route("/{identifier}/by-tickets", get(deals_by_tickets))
        .route("/{identifier}/page", get(deals_page))
}
