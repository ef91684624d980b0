//! # Bridge Data
//!
//! 체결/필 히스토리와 PnL 설정 데이터의 Postgres 영속화.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `Database` 연결 풀 래퍼 및 마이그레이션
//! - 매니저 체결 / 터미널 필 repository
//! - 그룹/심볼 설정, 환율, 심볼 매핑 repository

pub mod error;
pub mod storage;

pub use error::{DataError, Result};
pub use storage::*;
