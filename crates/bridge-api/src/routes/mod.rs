//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness / readiness)
//! - `/api/v1/accounts` - 게이트웨이 세션 관리
//! - `/api/v1/deals` - 라이브/과거 체결 조회
//! - `/api/v1/positions` - 오픈 포지션 스냅샷
//! - `/api/v1/groups` - 그룹 설정 카탈로그
//! - `/api/v1/symbols` - 심볼 설정 카탈로그
//! - `/api/v1/users` - 그룹별 계정 목록
//! - `/api/v1/mappings` - 매니저/터미널 심볼 매핑
//! - `/api/v1/pnl` - 브로커 손익 분해

pub mod accounts;
pub mod deals;
pub mod groups;
pub mod health;
pub mod mappings;
pub mod pnl;
pub mod positions;
pub mod symbols;
pub mod users;

pub use accounts::{accounts_router, AccountsListResponse, ConnectResponse, DisconnectResponse};
pub use deals::{deals_router, DealsListResponse};
pub use groups::{groups_router, GroupsListResponse};
pub use health::{health_router, ComponentStatus, HealthResponse};
pub use mappings::{mappings_router, MappingPair, MappingsListResponse, ReplaceMappingsRequest};
pub use pnl::pnl_router;
pub use positions::{positions_router, PositionsListResponse};
pub use symbols::{symbols_router, SymbolsListResponse};
pub use users::{users_router, UsersListResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/accounts", accounts_router())
        .nest("/api/v1/deals", deals_router())
        .nest("/api/v1/positions", positions_router())
        .nest("/api/v1/groups", groups_router())
        .nest("/api/v1/symbols", symbols_router())
        .nest("/api/v1/users", users_router())
        .nest("/api/v1/mappings", mappings_router())
        .nest("/api/v1/pnl", pnl_router())
}
