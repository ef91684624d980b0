//! 오픈 포지션 스냅샷.

use crate::domain::{Coded, DealAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 오픈 포지션 기록.
///
/// 체결과 달리 포지션은 일시적인 상태이며, 폴링할 때마다 전체가
/// 새 스냅샷으로 교체됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// 포지션 티켓 번호
    pub ticket: u64,
    /// 계정 로그인
    pub login: u64,
    /// 심볼
    pub symbol: String,
    /// 방향 (Buy/Sell)
    pub action: Coded<DealAction>,
    /// 수량 (랏)
    pub volume: f64,
    /// 진입 가격
    pub price_open: f64,
    /// 현재 가격
    pub price_current: f64,
    /// 미실현 손익
    pub profit: f64,
    /// 진입 시각
    pub time_open: DateTime<Utc>,
}
