//! # Bridge Gateway
//!
//! 매니저 게이트웨이 연결 및 라이브/과거 데이터 처리.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `ManagerApi` trait: 블로킹 SDK 경계
//! - 세션 레지스트리 및 연결 수명주기
//! - 라이브 체결 수집 싱크와 브로드캐스트 팬아웃
//! - 과거 체결 조회 퍼사드 및 카탈로그 조회
//! - 시뮬레이션 SDK (테스트 및 개발 서버용)

pub mod catalog;
pub mod error;
pub mod fanout;
pub mod history;
pub mod normalize;
pub mod registry;
pub mod session;
pub mod simulated;
pub mod sink;
pub mod traits;

pub use error::{GatewayError, GatewayResult};
pub use fanout::FanoutHub;
pub use registry::{ManagerApiFactory, SessionRegistry};
pub use session::{ConnectionState, Session, SessionSummary};
pub use simulated::{SimulatedConfig, SimulatedManagerApi};
pub use sink::{BufferSink, DealBuffer};
pub use traits::{
    DealSink, ManagerApi, ManagerCredentials, RawCommission, RawDeal, RawGroup, RawGroupSymbol,
    RawPosition, RawSymbolInfo, RawTier, RawUser,
};
