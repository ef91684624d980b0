//! 브로커 PnL 집계 엔진.
//!
//! 저장된 체결/필 데이터에서 브로커 손익 분해를 계산합니다:
//!
//! - 마크업 = (진입가 − 게이트웨이가) × 수량 × 계약크기
//! - 수수료 = 수량이 속한 첫 구간의 요율 × 수량 (속한 구간이 없으면 0)
//! - 스왑 = 수량 × (Buy 는 swap_long, 아니면 swap_short)
//! - LP 비용 = Σ 필 (profit + swap + commission)
//! - 브로커 PnL = 마크업 + 수수료 − LP 비용
//!
//! 체결 금액은 심볼의 손익 통화 기준이며, 체결 진입 시각 이전의
//! 가장 최근 환율로 USD 로 환산됩니다 (USD 는 정의상 1). 설정이나
//! 환율이 없으면 부분 합계 없이 요청 전체가 실패합니다.

use crate::sources::{ConfigSource, DealSource, FillSource, FxSource};
use bridge_core::{BridgeError, BridgeResult};
use bridge_data::{GroupConfig, SymbolConfigRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// PnL 분해 합계.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlSummary {
    /// 스프레드 마크업 수익 (USD)
    pub total_markup: Decimal,
    /// 클라이언트 수수료 수익 (USD)
    pub total_commission: Decimal,
    /// 클라이언트 스왑 합계 (USD)
    pub total_swap_client: Decimal,
    /// LP 측 비용 합계
    pub total_lp_cost: Decimal,
    /// 브로커 손익
    pub broker_pnl: Decimal,
}

/// PnL 보고서.
#[derive(Debug, Clone, Serialize)]
pub struct PnlReport {
    /// 창 시작
    pub date_from: DateTime<Utc>,
    /// 창 끝
    pub date_to: DateTime<Utc>,
    /// 심볼 필터 (없으면 전체)
    pub symbol: Option<String>,
    /// 분해 합계
    pub summary: PnlSummary,
}

/// PnL 집계 엔진.
///
/// 결정적입니다: 같은 입력 데이터에 대해 항상 같은 보고서를 냅니다.
pub struct PnlEngine {
    deals: Arc<dyn DealSource>,
    fills: Arc<dyn FillSource>,
    configs: Arc<dyn ConfigSource>,
    fx: Arc<dyn FxSource>,
}

impl PnlEngine {
    /// 데이터 소스를 묶어 엔진을 생성합니다.
    pub fn new(
        deals: Arc<dyn DealSource>,
        fills: Arc<dyn FillSource>,
        configs: Arc<dyn ConfigSource>,
        fx: Arc<dyn FxSource>,
    ) -> Self {
        Self {
            deals,
            fills,
            configs,
            fx,
        }
    }

    /// 주어진 창의 PnL 보고서를 계산합니다.
    pub async fn compute(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
        symbol: Option<&str>,
    ) -> BridgeResult<PnlReport> {
        let deals = self.deals.deals_in_window(date_from, date_to, symbol).await?;
        let fills = self.fills.fills_in_window(date_from, date_to, symbol).await?;

        // 요청 범위 캐시
        let mut group_cache: HashMap<String, GroupConfig> = HashMap::new();
        let mut symbol_cache: HashMap<String, SymbolConfigRecord> = HashMap::new();
        let mut fx_cache: HashMap<(String, DateTime<Utc>), Decimal> = HashMap::new();

        let mut total_markup = Decimal::ZERO;
        let mut total_commission = Decimal::ZERO;
        let mut total_swap_client = Decimal::ZERO;

        for deal in &deals {
            let symbol_config = match symbol_cache.get(&deal.symbol) {
                Some(config) => config.clone(),
                None => {
                    let config =
                        self.configs.symbol_config(&deal.symbol).await?.ok_or_else(|| {
                            BridgeError::ConfigMissing(format!(
                                "symbol config missing: {}",
                                deal.symbol
                            ))
                        })?;
                    symbol_cache.insert(deal.symbol.clone(), config.clone());
                    config
                }
            };
            let group_config = match group_cache.get(&deal.group_id) {
                Some(config) => config.clone(),
                None => {
                    let config =
                        self.configs.group_config(&deal.group_id).await?.ok_or_else(|| {
                            BridgeError::ConfigMissing(format!(
                                "group config missing: {}",
                                deal.group_id
                            ))
                        })?;
                    group_cache.insert(deal.group_id.clone(), config.clone());
                    config
                }
            };

            let markup = (deal.open_price - deal.gateway_price) * deal.volume * deal.contract_size;

            let commission_rate = group_config
                .tiers
                .iter()
                .find(|tier| tier.range_from <= deal.volume && deal.volume <= tier.range_to)
                .map(|tier| tier.value)
                .unwrap_or(Decimal::ZERO);
            let commission = commission_rate * deal.volume;

            let swap_rate = if deal.action == "Buy" {
                group_config.record.swap_long
            } else {
                group_config.record.swap_short
            };
            let swap = swap_rate * deal.volume;

            let rate = self
                .usd_rate(
                    &symbol_config.currency_profit,
                    deal.open_time,
                    &mut fx_cache,
                )
                .await?;

            total_markup += markup * rate;
            total_commission += commission * rate;
            total_swap_client += swap * rate;
        }

        let total_lp_cost: Decimal = fills
            .iter()
            .map(|fill| fill.profit + fill.swap + fill.commission)
            .sum();

        let broker_pnl = total_markup + total_commission - total_lp_cost;

        tracing::debug!(
            deals = deals.len(),
            fills = fills.len(),
            %broker_pnl,
            "PnL window computed"
        );

        Ok(PnlReport {
            date_from,
            date_to,
            symbol: symbol.map(str::to_string),
            summary: PnlSummary {
                total_markup,
                total_commission,
                total_swap_client,
                total_lp_cost,
                broker_pnl,
            },
        })
    }

    /// 통화의 USD 환율을 반환합니다. USD 는 정의상 1이고, 그 외에는
    /// 주어진 시각 이전의 가장 최근 환율입니다. 부재는 하드 실패입니다.
    async fn usd_rate(
        &self,
        currency: &str,
        instant: DateTime<Utc>,
        cache: &mut HashMap<(String, DateTime<Utc>), Decimal>,
    ) -> BridgeResult<Decimal> {
        if currency.eq_ignore_ascii_case("USD") {
            return Ok(Decimal::ONE);
        }

        let key = (currency.to_string(), instant);
        if let Some(rate) = cache.get(&key) {
            return Ok(*rate);
        }

        let rate = self
            .fx
            .rate_at_or_before(currency, instant)
            .await?
            .ok_or_else(|| {
                BridgeError::ConfigMissing(format!(
                    "FX rate for {} not found at {}",
                    currency, instant
                ))
            })?;

        cache.insert(key, rate);
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ConfigSource, DealSource, FillSource, FxSource};
    use async_trait::async_trait;
    use bridge_data::{
        CommissionTierRecord, FxRateRecord, GroupConfigRecord, ManagerDealRecord,
        TerminalFillRecord,
    };
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct MemSource {
        deals: Vec<ManagerDealRecord>,
        fills: Vec<TerminalFillRecord>,
        groups: HashMap<String, GroupConfig>,
        symbols: HashMap<String, SymbolConfigRecord>,
        fx: Vec<FxRateRecord>,
    }

    #[async_trait]
    impl DealSource for MemSource {
        async fn deals_in_window(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
            symbol: Option<&str>,
        ) -> BridgeResult<Vec<ManagerDealRecord>> {
            Ok(self
                .deals
                .iter()
                .filter(|deal| symbol.map_or(true, |s| deal.symbol == s))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl FillSource for MemSource {
        async fn fills_in_window(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
            symbol: Option<&str>,
        ) -> BridgeResult<Vec<TerminalFillRecord>> {
            Ok(self
                .fills
                .iter()
                .filter(|fill| symbol.map_or(true, |s| fill.symbol == s))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl ConfigSource for MemSource {
        async fn group_config(&self, group_id: &str) -> BridgeResult<Option<GroupConfig>> {
            Ok(self.groups.get(group_id).cloned())
        }

        async fn symbol_config(&self, symbol: &str) -> BridgeResult<Option<SymbolConfigRecord>> {
            Ok(self.symbols.get(symbol).cloned())
        }
    }

    #[async_trait]
    impl FxSource for MemSource {
        async fn rate_at_or_before(
            &self,
            base: &str,
            instant: DateTime<Utc>,
        ) -> BridgeResult<Option<Decimal>> {
            Ok(self
                .fx
                .iter()
                .filter(|row| row.base == base && row.date <= instant)
                .max_by_key(|row| row.date)
                .map(|row| row.rate))
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn deal(symbol: &str, group_id: &str, action: &str) -> ManagerDealRecord {
        ManagerDealRecord {
            ticket: 1,
            login: 1001,
            group_id: group_id.to_string(),
            symbol: symbol.to_string(),
            open_time: at(1_000),
            close_time: at(2_000),
            open_price: dec!(1.1000),
            close_price: dec!(1.1030),
            gateway_price: dec!(1.0995),
            volume: dec!(10),
            contract_size: dec!(100000),
            action: action.to_string(),
            profit: dec!(300),
            swap: dec!(0),
            commission: dec!(0),
        }
    }

    fn standard_group() -> GroupConfig {
        GroupConfig {
            record: GroupConfigRecord {
                group_id: "real\\Standard".to_string(),
                currency: "USD".to_string(),
                swap_long: dec!(-2.5),
                swap_short: dec!(-1.0),
            },
            tiers: vec![CommissionTierRecord {
                group_id: "real\\Standard".to_string(),
                tier_index: 0,
                range_from: dec!(0),
                range_to: dec!(100),
                value: dec!(0.00007),
            }],
        }
    }

    fn usd_symbol(symbol: &str) -> SymbolConfigRecord {
        SymbolConfigRecord {
            symbol: symbol.to_string(),
            contract_size: dec!(100000),
            currency_profit: "USD".to_string(),
        }
    }

    fn engine(source: MemSource) -> PnlEngine {
        let source = Arc::new(source);
        PnlEngine::new(source.clone(), source.clone(), source.clone(), source)
    }

    #[tokio::test]
    async fn worked_example_is_exact() {
        let mut source = MemSource::default();
        source.deals.push(deal("EURUSD", "real\\Standard", "Buy"));
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert("EURUSD".to_string(), usd_symbol("EURUSD"));

        let report = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap();

        assert_eq!(report.summary.total_markup, dec!(500.0));
        assert_eq!(report.summary.total_commission, dec!(0.0007));
        assert_eq!(report.summary.total_swap_client, dec!(-25.0));
        assert_eq!(report.summary.total_lp_cost, dec!(0));
        assert_eq!(report.summary.broker_pnl, dec!(500.0007));
    }

    #[tokio::test]
    async fn missing_group_config_is_hard_failure() {
        let mut source = MemSource::default();
        source.deals.push(deal("EURUSD", "real\\Unknown", "Buy"));
        source.symbols.insert("EURUSD".to_string(), usd_symbol("EURUSD"));

        let err = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap_err();

        match err {
            BridgeError::ConfigMissing(message) => assert!(message.contains("real\\Unknown")),
            other => panic!("expected ConfigMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_symbol_config_is_hard_failure() {
        let mut source = MemSource::default();
        source.deals.push(deal("XAUUSD", "real\\Standard", "Buy"));
        source.groups.insert("real\\Standard".to_string(), standard_group());

        let err = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ConfigMissing(_)));
    }

    #[tokio::test]
    async fn missing_fx_rate_is_hard_failure() {
        let mut source = MemSource::default();
        source.deals.push(deal("EURPLN", "real\\Standard", "Buy"));
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert(
            "EURPLN".to_string(),
            SymbolConfigRecord {
                symbol: "EURPLN".to_string(),
                contract_size: dec!(100000),
                currency_profit: "PLN".to_string(),
            },
        );

        let err = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap_err();

        match err {
            BridgeError::ConfigMissing(message) => assert!(message.contains("PLN")),
            other => panic!("expected ConfigMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fx_conversion_uses_latest_rate_at_or_before_open() {
        let mut source = MemSource::default();
        source.deals.push(deal("USDJPY", "real\\Standard", "Buy"));
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert(
            "USDJPY".to_string(),
            SymbolConfigRecord {
                symbol: "USDJPY".to_string(),
                contract_size: dec!(100000),
                currency_profit: "JPY".to_string(),
            },
        );
        // open_time 은 1000: 800 시점 환율이 선택되고 이후 시점은 무시된다
        source.fx = vec![
            FxRateRecord {
                base: "JPY".to_string(),
                date: at(500),
                rate: dec!(0.009),
            },
            FxRateRecord {
                base: "JPY".to_string(),
                date: at(800),
                rate: dec!(0.01),
            },
            FxRateRecord {
                base: "JPY".to_string(),
                date: at(1_500),
                rate: dec!(0.011),
            },
        ];

        let report = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap();

        // 마크업 500 JPY × 0.01 = 5 USD
        assert_eq!(report.summary.total_markup, dec!(5.00000));
    }

    #[tokio::test]
    async fn fx_rate_dated_after_open_does_not_count() {
        let mut source = MemSource::default();
        // 진입 1000 / 청산 2000, 환율 행은 1500 하나뿐
        source.deals.push(deal("USDJPY", "real\\Standard", "Buy"));
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert(
            "USDJPY".to_string(),
            SymbolConfigRecord {
                symbol: "USDJPY".to_string(),
                contract_size: dec!(100000),
                currency_profit: "JPY".to_string(),
            },
        );
        source.fx = vec![FxRateRecord {
            base: "JPY".to_string(),
            date: at(1_500),
            rate: dec!(0.01),
        }];

        let err = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap_err();

        match err {
            BridgeError::ConfigMissing(message) => assert!(message.contains("JPY")),
            other => panic!("expected ConfigMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn volume_outside_tiers_gets_zero_commission() {
        let mut source = MemSource::default();
        let mut big = deal("EURUSD", "real\\Standard", "Buy");
        big.volume = dec!(500);
        source.deals.push(big);
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert("EURUSD".to_string(), usd_symbol("EURUSD"));

        let report = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap();

        assert_eq!(report.summary.total_commission, dec!(0));
    }

    #[tokio::test]
    async fn sell_uses_short_swap_rate() {
        let mut source = MemSource::default();
        source.deals.push(deal("EURUSD", "real\\Standard", "Sell"));
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert("EURUSD".to_string(), usd_symbol("EURUSD"));

        let report = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap();

        assert_eq!(report.summary.total_swap_client, dec!(-10.0)); // -1.0 × 10
    }

    #[tokio::test]
    async fn lp_cost_subtracts_from_broker_pnl() {
        let mut source = MemSource::default();
        source.deals.push(deal("EURUSD", "real\\Standard", "Buy"));
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert("EURUSD".to_string(), usd_symbol("EURUSD"));
        source.fills.push(TerminalFillRecord {
            ticket: 9,
            symbol: "EURUSD".to_string(),
            time: at(1_500),
            volume: dec!(1),
            price: dec!(1.1000),
            profit: dec!(120),
            swap: dec!(-5),
            commission: dec!(-3),
        });

        let report = engine(source)
            .compute(at(0), at(10_000), None)
            .await
            .unwrap();

        assert_eq!(report.summary.total_lp_cost, dec!(112));
        assert_eq!(report.summary.broker_pnl, dec!(388.0007));
    }

    #[tokio::test]
    async fn symbol_filter_narrows_both_deals_and_fills() {
        let mut source = MemSource::default();
        source.deals.push(deal("EURUSD", "real\\Standard", "Buy"));
        let mut gold = deal("XAUUSD", "real\\Standard", "Buy");
        gold.ticket = 2;
        source.deals.push(gold);
        source.groups.insert("real\\Standard".to_string(), standard_group());
        source.symbols.insert("EURUSD".to_string(), usd_symbol("EURUSD"));
        source.symbols.insert("XAUUSD".to_string(), usd_symbol("XAUUSD"));

        let report = engine(source)
            .compute(at(0), at(10_000), Some("EURUSD"))
            .await
            .unwrap();

        assert_eq!(report.symbol.as_deref(), Some("EURUSD"));
        assert_eq!(report.summary.total_markup, dec!(500.0));
    }
}
