//! # Bridge PnL
//!
//! 저장된 체결/필 데이터에서 브로커 손익 분해를 계산합니다.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `PnlEngine`: 결정적 PnL 집계
//! - 데이터 소스 trait (운영: bridge-data repository, 테스트: 인메모리)

pub mod engine;
pub mod sources;

pub use engine::{PnlEngine, PnlReport, PnlSummary};
pub use sources::{ConfigSource, DealSource, FillSource, FxSource, RepositoryConfigSource};
