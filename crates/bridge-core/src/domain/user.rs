//! 계정(유저) 기록.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 게이트웨이 계정 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// 계정 로그인
    pub login: u64,
    /// 소속 그룹
    pub group: String,
    /// 계정 이름
    pub name: String,
    /// 레버리지
    pub leverage: u32,
    /// 잔고
    pub balance: f64,
    /// 크레딧
    pub credit: f64,
    /// 가입 시각
    pub registration: DateTime<Utc>,
}
