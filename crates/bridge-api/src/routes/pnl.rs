//! 브로커 손익 분해 endpoint.
//!
//! 저장된 체결/필에서 계산하므로 데이터베이스가 필요합니다.
//! 날짜는 `YYYY-MM-DD` 이며 창은 양끝을 포함합니다.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use bridge_core::BridgeError;
use bridge_pnl::PnlReport;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{bridge_error_response, db_not_configured, ApiResult};
use crate::state::AppState;

/// PnL 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct PnlParams {
    /// 창 시작 날짜 (포함)
    pub date_from: NaiveDate,
    /// 창 끝 날짜 (포함)
    pub date_to: NaiveDate,
    /// 심볼 필터 (선택적)
    pub symbol: Option<String>,
}

/// 주어진 창의 브로커 PnL 보고서를 계산합니다.
///
/// GET /api/v1/pnl?date_from=2026-08-01&date_to=2026-08-31&symbol=EURUSD
pub async fn compute_pnl(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PnlParams>,
) -> ApiResult<Json<PnlReport>> {
    let engine = state.pnl.as_ref().ok_or_else(db_not_configured)?;

    if params.date_from > params.date_to {
        return Err(bridge_error_response(BridgeError::ValidationFailure(
            "date_from must not be after date_to".to_string(),
        )));
    }

    let from = params.date_from.and_time(NaiveTime::MIN).and_utc();
    // 끝 날짜의 마지막 초까지 포함
    let to = params.date_to.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
        - Duration::seconds(1);

    let report = engine
        .compute(from, to, params.symbol.as_deref())
        .await
        .map_err(bridge_error_response)?;

    Ok(Json(report))
}

/// PnL 라우터 생성.
pub fn pnl_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(compute_pnl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_pnl_without_db_is_503() {
        let app = Router::new()
            .nest("/api/v1/pnl", pnl_router())
            .with_state(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pnl?date_from=2026-08-01&date_to=2026-08-31")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_pnl_malformed_date_is_400() {
        let app = Router::new()
            .nest("/api/v1/pnl", pnl_router())
            .with_state(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pnl?date_from=not-a-date&date_to=2026-08-31")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
