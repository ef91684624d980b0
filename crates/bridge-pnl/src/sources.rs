//! PnL 계산의 데이터 소스 trait.
//!
//! 엔진을 저장소 구현에서 분리합니다. 운영 구현은 bridge-data 의
//! repository 이고, 테스트는 인메모리 소스를 사용합니다.

use async_trait::async_trait;
use bridge_core::BridgeResult;
use bridge_data::{
    FxRateRepository, GroupConfig, GroupConfigRepository, ManagerDealRecord,
    ManagerDealRepository, SymbolConfigRecord, SymbolConfigRepository, TerminalFillRecord,
    TerminalFillRepository,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// 창 내 체결 소스.
#[async_trait]
pub trait DealSource: Send + Sync {
    async fn deals_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        symbol: Option<&str>,
    ) -> BridgeResult<Vec<ManagerDealRecord>>;
}

/// 창 내 LP 필 소스.
#[async_trait]
pub trait FillSource: Send + Sync {
    async fn fills_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        symbol: Option<&str>,
    ) -> BridgeResult<Vec<TerminalFillRecord>>;
}

/// 그룹/심볼 설정 소스.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn group_config(&self, group_id: &str) -> BridgeResult<Option<GroupConfig>>;
    async fn symbol_config(&self, symbol: &str) -> BridgeResult<Option<SymbolConfigRecord>>;
}

/// 환율 소스.
#[async_trait]
pub trait FxSource: Send + Sync {
    async fn rate_at_or_before(
        &self,
        base: &str,
        instant: DateTime<Utc>,
    ) -> BridgeResult<Option<Decimal>>;
}

#[async_trait]
impl DealSource for ManagerDealRepository {
    async fn deals_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        symbol: Option<&str>,
    ) -> BridgeResult<Vec<ManagerDealRecord>> {
        Ok(self.find_in_range(from, to, symbol).await?)
    }
}

#[async_trait]
impl FillSource for TerminalFillRepository {
    async fn fills_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        symbol: Option<&str>,
    ) -> BridgeResult<Vec<TerminalFillRecord>> {
        Ok(self.find_in_range(from, to, symbol).await?)
    }
}

/// 그룹과 심볼 repository 를 묶은 설정 소스.
pub struct RepositoryConfigSource {
    pub groups: GroupConfigRepository,
    pub symbols: SymbolConfigRepository,
}

#[async_trait]
impl ConfigSource for RepositoryConfigSource {
    async fn group_config(&self, group_id: &str) -> BridgeResult<Option<GroupConfig>> {
        Ok(self.groups.find(group_id).await?)
    }

    async fn symbol_config(&self, symbol: &str) -> BridgeResult<Option<SymbolConfigRecord>> {
        Ok(self.symbols.find(symbol).await?)
    }
}

#[async_trait]
impl FxSource for FxRateRepository {
    async fn rate_at_or_before(
        &self,
        base: &str,
        instant: DateTime<Utc>,
    ) -> BridgeResult<Option<Decimal>> {
        Ok(FxRateRepository::rate_at_or_before(self, base, instant).await?)
    }
}
