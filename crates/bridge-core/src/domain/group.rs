//! 그룹 설정 스냅샷.
//!
//! 게이트웨이가 반환하는 라이브 그룹 설정을 타입으로 고정합니다.
//! 리플렉션 없이 명시적 필드 목록만 사용합니다.

use serde::{Deserialize, Serialize};

/// 그룹 설정 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    /// 그룹 이름 (예: "real\\Standard")
    pub group: String,
    /// 트레이드 서버 ID
    pub server: u64,
    /// 회사 이름
    pub company: String,
    /// 예치 통화
    pub currency: String,
    /// 기본 레버리지
    pub leverage: u32,
    /// 수수료 설정 목록
    pub commissions: Vec<GroupCommission>,
    /// 그룹별 심볼 설정 목록
    pub symbols: Vec<GroupSymbolSettings>,
}

/// 그룹 수수료 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCommission {
    /// 수수료 이름
    pub name: String,
    /// 적용 대상 심볼 경로 마스크
    pub path: String,
    /// 구간별 수수료
    pub tiers: Vec<CommissionTier>,
}

/// 수량 구간별 수수료.
///
/// `range_from <= volume <= range_to` 인 첫 구간의 `value` 가 적용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionTier {
    /// 구간 하한 (랏)
    pub range_from: f64,
    /// 구간 상한 (랏)
    pub range_to: f64,
    /// 수수료율
    pub value: f64,
}

impl CommissionTier {
    /// 주어진 수량이 이 구간에 속하는지 확인합니다.
    pub fn contains(&self, volume: f64) -> bool {
        self.range_from <= volume && volume <= self.range_to
    }
}

/// 그룹별 심볼 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSymbolSettings {
    /// 심볼 경로 마스크
    pub path: String,
    /// 매수 포지션 스왑
    pub swap_long: f64,
    /// 매도 포지션 스왑
    pub swap_short: f64,
    /// 스프레드 차이 (포인트)
    pub spread_diff: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_tier_bounds_inclusive() {
        let tier = CommissionTier {
            range_from: 0.0,
            range_to: 10.0,
            value: 0.0007,
        };

        assert!(tier.contains(0.0));
        assert!(tier.contains(10.0));
        assert!(tier.contains(2.5));
        assert!(!tier.contains(10.01));
    }
}
