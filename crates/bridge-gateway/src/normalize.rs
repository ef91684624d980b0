//! 원시 SDK 레코드의 도메인 타입 정규화.
//!
//! 코드→이름 변환의 단일 지점입니다. 싱크와 조회 퍼사드 양쪽이
//! 이 모듈을 통해서만 도메인 타입을 생성합니다.

use crate::traits::{RawDeal, RawGroup, RawPosition, RawSymbolInfo, RawUser};
use bridge_core::{
    Coded, CommissionTier, Deal, GroupCommission, GroupSnapshot, GroupSymbolSettings, ModifyFlag,
    Position, SymbolInfo, UserRecord,
};
use chrono::{DateTime, Utc};

/// 유닉스 초를 UTC 시각으로 변환합니다. 범위 밖 값은 에포크로 고정됩니다.
fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// 원시 체결을 정규화합니다.
pub fn normalize_deal(raw: RawDeal) -> Deal {
    Deal {
        ticket: raw.ticket,
        login: raw.login,
        order: raw.order,
        external_id: raw.external_id,
        dealer: raw.dealer,
        action: Coded::from_code(raw.action),
        entry: Coded::from_code(raw.entry),
        reason: Coded::from_code(raw.reason),
        digits: raw.digits,
        contract_size: raw.contract_size,
        time: timestamp(raw.time),
        time_msc: raw.time_msc,
        symbol: raw.symbol,
        price: raw.price,
        price_sl: raw.price_sl,
        price_tp: raw.price_tp,
        price_position: raw.price_position,
        price_gateway: raw.price_gateway,
        volume: raw.volume,
        volume_closed: raw.volume_closed,
        profit: raw.profit,
        swap: raw.storage,
        commission: raw.commission,
        fee: raw.fee,
        rate_profit: raw.rate_profit,
        rate_margin: raw.rate_margin,
        expert_id: raw.expert_id,
        position_id: raw.position_id,
        comment: raw.comment,
        gateway: raw.gateway,
        market_bid: raw.market_bid,
        market_ask: raw.market_ask,
        market_last: raw.market_last,
        modification_flags: ModifyFlag::decode(raw.modification_flags),
    }
}

/// 원시 포지션을 정규화합니다.
pub fn normalize_position(raw: RawPosition) -> Position {
    Position {
        ticket: raw.ticket,
        login: raw.login,
        symbol: raw.symbol,
        action: Coded::from_code(raw.action),
        volume: raw.volume,
        price_open: raw.price_open,
        price_current: raw.price_current,
        profit: raw.profit,
        time_open: timestamp(raw.time_create),
    }
}

/// 원시 그룹 설정을 정규화합니다. 수수료 구간은 하한 오름차순으로 정렬됩니다.
pub fn normalize_group(raw: RawGroup) -> GroupSnapshot {
    GroupSnapshot {
        group: raw.group,
        server: raw.server,
        company: raw.company,
        currency: raw.currency,
        leverage: raw.leverage,
        commissions: raw
            .commissions
            .into_iter()
            .map(|commission| {
                let mut tiers: Vec<CommissionTier> = commission
                    .tiers
                    .into_iter()
                    .map(|tier| CommissionTier {
                        range_from: tier.range_from,
                        range_to: tier.range_to,
                        value: tier.value,
                    })
                    .collect();
                tiers.sort_by(|a, b| a.range_from.total_cmp(&b.range_from));

                GroupCommission {
                    name: commission.name,
                    path: commission.path,
                    tiers,
                }
            })
            .collect(),
        symbols: raw
            .symbols
            .into_iter()
            .map(|symbol| GroupSymbolSettings {
                path: symbol.path,
                swap_long: symbol.swap_long,
                swap_short: symbol.swap_short,
                spread_diff: symbol.spread_diff,
            })
            .collect(),
    }
}

/// 원시 심볼 정보를 정규화합니다.
pub fn normalize_symbol(raw: RawSymbolInfo) -> SymbolInfo {
    SymbolInfo {
        symbol: raw.symbol,
        path: raw.path,
        description: raw.description,
        currency_base: raw.currency_base,
        currency_profit: raw.currency_profit,
        contract_size: raw.contract_size,
        digits: raw.digits,
        point: raw.point,
        swap_long: raw.swap_long,
        swap_short: raw.swap_short,
    }
}

/// 원시 계정 레코드를 정규화합니다.
pub fn normalize_user(raw: RawUser) -> UserRecord {
    UserRecord {
        login: raw.login,
        group: raw.group,
        name: raw.name,
        leverage: raw.leverage,
        balance: raw.balance,
        credit: raw.credit,
        registration: timestamp(raw.registration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{RawCommission, RawTier};
    use bridge_core::{DealAction, DealEntry};

    #[test]
    fn test_normalize_deal_decodes_enums() {
        let raw = RawDeal {
            ticket: 123,
            login: 1001,
            action: 0,
            entry: 1,
            reason: 4,
            storage: -2.5,
            modification_flags: 0x0000_0005,
            time: 1_700_000_000,
            symbol: "XAUUSD".to_string(),
            ..Default::default()
        };

        let deal = normalize_deal(raw);
        assert_eq!(deal.action, Coded::Known(DealAction::Buy));
        assert_eq!(deal.entry, Coded::Known(DealEntry::Out));
        assert_eq!(deal.swap, -2.5);
        assert_eq!(
            deal.modification_flags,
            vec![ModifyFlag::Admin, ModifyFlag::Position]
        );
        assert_eq!(deal.time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_normalize_deal_keeps_unknown_codes() {
        let raw = RawDeal {
            action: 99,
            ..Default::default()
        };

        let deal = normalize_deal(raw);
        assert_eq!(deal.action, Coded::Unknown(99));
    }

    #[test]
    fn test_normalize_group_orders_tiers() {
        let raw = RawGroup {
            group: "real\\Standard".to_string(),
            commissions: vec![RawCommission {
                name: "turnover".to_string(),
                path: "*".to_string(),
                tiers: vec![
                    RawTier {
                        range_from: 10.0,
                        range_to: 100.0,
                        value: 0.0005,
                    },
                    RawTier {
                        range_from: 0.0,
                        range_to: 10.0,
                        value: 0.0007,
                    },
                ],
            }],
            ..Default::default()
        };

        let group = normalize_group(raw);
        let tiers = &group.commissions[0].tiers;
        assert_eq!(tiers[0].range_from, 0.0);
        assert_eq!(tiers[1].range_from, 10.0);
    }
}
