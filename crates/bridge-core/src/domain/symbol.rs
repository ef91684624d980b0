//! 심볼 정보.

use serde::{Deserialize, Serialize};

/// 심볼 스펙 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// 심볼 이름 (예: "XAUUSD")
    pub symbol: String,
    /// 심볼 트리 경로 (예: "Metals\\XAUUSD")
    pub path: String,
    /// 설명
    pub description: String,
    /// 기초 통화
    pub currency_base: String,
    /// 손익 통화
    pub currency_profit: String,
    /// 계약 크기
    pub contract_size: f64,
    /// 가격 소수 자릿수
    pub digits: u32,
    /// 최소 가격 단위
    pub point: f64,
    /// 매수 포지션 스왑
    pub swap_long: f64,
    /// 매도 포지션 스왑
    pub swap_short: f64,
}
