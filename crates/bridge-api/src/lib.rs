//! # Bridge API
//!
//! 매니저 브리지의 REST/WebSocket 표면.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 세션 관리, 체결/포지션 조회, 카탈로그, 매핑, PnL REST 엔드포인트
//! - 라이브 체결/포지션 WebSocket 스트림
//! - 통합 에러 응답 및 `BridgeError` 상태 코드 매핑

pub mod error;
pub mod routes;
pub mod state;
pub mod websocket;

pub use error::{bridge_error_response, ApiErrorResponse, ApiResult};
pub use routes::create_api_router;
pub use state::AppState;
pub use websocket::websocket_router;
