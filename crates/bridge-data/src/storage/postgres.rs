//! Postgres 스토리지 구현.
//!
//! 체결/필 히스토리와 PnL 계산에 필요한 설정(그룹, 심볼, 환율,
//! 심볼 매핑)을 저장하고 조회하는 repository 패턴 구현입니다.
//! 금액 컬럼은 전부 `Decimal` 입니다.

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, info};

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &bridge_core::DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 Database 인스턴스를 생성합니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::MigrationError(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// 데이터베이스 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::QueryError(e.to_string()))?;
        Ok(true)
    }
}

// =============================================================================
// Manager Deal Repository
// =============================================================================

/// 매니저 체결 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct ManagerDealRecord {
    pub ticket: i64,
    pub login: i64,
    pub group_id: String,
    pub symbol: String,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub gateway_price: Decimal,
    pub volume: Decimal,
    pub contract_size: Decimal,
    pub action: String,
    pub profit: Decimal,
    pub swap: Decimal,
    pub commission: Decimal,
}

/// 매니저 체결 repository.
pub struct ManagerDealRepository {
    db: Database,
}

impl ManagerDealRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 기간(과 선택적 심볼)으로 체결을 조회합니다.
    ///
    /// 기간은 진입 시각과 청산 시각이 모두 창 안에 있는 체결을
    /// 의미합니다.
    pub async fn find_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        symbol: Option<&str>,
    ) -> Result<Vec<ManagerDealRecord>> {
        sqlx::query_as(
            r#"
            SELECT * FROM manager_deals
            WHERE open_time >= $1 AND close_time <= $2
              AND ($3::text IS NULL OR symbol = $3)
            ORDER BY close_time
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(symbol)
        .fetch_all(self.db.pool())
        .await
        .map_err(Into::into)
    }

    /// 체결을 저장합니다.
    pub async fn insert(&self, record: &ManagerDealRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO manager_deals (
                ticket, login, group_id, symbol, open_time, close_time,
                open_price, close_price, gateway_price, volume, contract_size,
                action, profit, swap, commission
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(record.ticket)
        .bind(record.login)
        .bind(&record.group_id)
        .bind(&record.symbol)
        .bind(record.open_time)
        .bind(record.close_time)
        .bind(record.open_price)
        .bind(record.close_price)
        .bind(record.gateway_price)
        .bind(record.volume)
        .bind(record.contract_size)
        .bind(&record.action)
        .bind(record.profit)
        .bind(record.swap)
        .bind(record.commission)
        .execute(self.db.pool())
        .await?;

        debug!(ticket = record.ticket, "Manager deal stored");
        Ok(())
    }
}

// =============================================================================
// Terminal Fill Repository
// =============================================================================

/// 터미널(LP) 필 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct TerminalFillRecord {
    pub ticket: i64,
    pub symbol: String,
    pub time: DateTime<Utc>,
    pub volume: Decimal,
    pub price: Decimal,
    pub profit: Decimal,
    pub swap: Decimal,
    pub commission: Decimal,
}

/// 터미널 필 repository.
pub struct TerminalFillRepository {
    db: Database,
}

impl TerminalFillRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 기간(과 선택적 심볼)으로 필을 조회합니다.
    pub async fn find_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        symbol: Option<&str>,
    ) -> Result<Vec<TerminalFillRecord>> {
        sqlx::query_as(
            r#"
            SELECT * FROM terminal_fills
            WHERE time >= $1 AND time <= $2
              AND ($3::text IS NULL OR symbol = $3)
            ORDER BY time
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(symbol)
        .fetch_all(self.db.pool())
        .await
        .map_err(Into::into)
    }

    /// 필을 저장합니다.
    pub async fn insert(&self, record: &TerminalFillRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO terminal_fills (
                ticket, symbol, time, volume, price, profit, swap, commission
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.ticket)
        .bind(&record.symbol)
        .bind(record.time)
        .bind(record.volume)
        .bind(record.price)
        .bind(record.profit)
        .bind(record.swap)
        .bind(record.commission)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

// =============================================================================
// Group Config Repository
// =============================================================================

/// 그룹 설정 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct GroupConfigRecord {
    pub group_id: String,
    pub currency: String,
    pub swap_long: Decimal,
    pub swap_short: Decimal,
}

/// 수수료 구간 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct CommissionTierRecord {
    pub group_id: String,
    pub tier_index: i32,
    pub range_from: Decimal,
    pub range_to: Decimal,
    pub value: Decimal,
}

/// 그룹 설정 + 정렬된 수수료 구간.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    pub record: GroupConfigRecord,
    pub tiers: Vec<CommissionTierRecord>,
}

/// 그룹 설정 repository.
pub struct GroupConfigRepository {
    db: Database,
}

impl GroupConfigRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 그룹 설정과 수수료 구간을 조회합니다 (구간은 하한 오름차순).
    pub async fn find(&self, group_id: &str) -> Result<Option<GroupConfig>> {
        let record: Option<GroupConfigRecord> =
            sqlx::query_as("SELECT * FROM group_configs WHERE group_id = $1")
                .bind(group_id)
                .fetch_optional(self.db.pool())
                .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let tiers: Vec<CommissionTierRecord> = sqlx::query_as(
            r#"
            SELECT * FROM group_commission_tiers
            WHERE group_id = $1
            ORDER BY range_from
            "#,
        )
        .bind(group_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(Some(GroupConfig { record, tiers }))
    }

    /// 그룹 설정을 저장하거나 갱신합니다. 수수료 구간은 통째로 교체됩니다.
    pub async fn upsert(&self, config: &GroupConfig) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO group_configs (group_id, currency, swap_long, swap_short)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (group_id) DO UPDATE SET
                currency = EXCLUDED.currency,
                swap_long = EXCLUDED.swap_long,
                swap_short = EXCLUDED.swap_short
            "#,
        )
        .bind(&config.record.group_id)
        .bind(&config.record.currency)
        .bind(config.record.swap_long)
        .bind(config.record.swap_short)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM group_commission_tiers WHERE group_id = $1")
            .bind(&config.record.group_id)
            .execute(&mut *tx)
            .await?;

        for tier in &config.tiers {
            sqlx::query(
                r#"
                INSERT INTO group_commission_tiers (group_id, tier_index, range_from, range_to, value)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&tier.group_id)
            .bind(tier.tier_index)
            .bind(tier.range_from)
            .bind(tier.range_to)
            .bind(tier.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Symbol Config Repository
// =============================================================================

/// 심볼 설정 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct SymbolConfigRecord {
    pub symbol: String,
    pub contract_size: Decimal,
    pub currency_profit: String,
}

/// 심볼 설정 repository.
pub struct SymbolConfigRepository {
    db: Database,
}

impl SymbolConfigRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 심볼 설정을 조회합니다.
    pub async fn find(&self, symbol: &str) -> Result<Option<SymbolConfigRecord>> {
        sqlx::query_as("SELECT * FROM symbol_configs WHERE symbol = $1")
            .bind(symbol)
            .fetch_optional(self.db.pool())
            .await
            .map_err(Into::into)
    }

    /// 심볼 설정을 저장하거나 갱신합니다.
    pub async fn upsert(&self, record: &SymbolConfigRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO symbol_configs (symbol, contract_size, currency_profit)
            VALUES ($1, $2, $3)
            ON CONFLICT (symbol) DO UPDATE SET
                contract_size = EXCLUDED.contract_size,
                currency_profit = EXCLUDED.currency_profit
            "#,
        )
        .bind(&record.symbol)
        .bind(record.contract_size)
        .bind(&record.currency_profit)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

// =============================================================================
// FX Rate Repository
// =============================================================================

/// 환율 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct FxRateRecord {
    pub base: String,
    pub date: DateTime<Utc>,
    pub rate: Decimal,
}

/// 환율 repository.
pub struct FxRateRepository {
    db: Database,
}

impl FxRateRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 주어진 시각 이전(포함) 가장 최근 환율을 조회합니다.
    ///
    /// 부재는 `Ok(None)` 입니다. 기본값으로 대체하지 않으며, PnL
    /// 계층이 부재를 하드 실패로 처리합니다.
    pub async fn rate_at_or_before(
        &self,
        base: &str,
        instant: DateTime<Utc>,
    ) -> Result<Option<Decimal>> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"
            SELECT rate FROM fx_rates
            WHERE base = $1 AND date <= $2
            ORDER BY date DESC
            LIMIT 1
            "#,
        )
        .bind(base)
        .bind(instant)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|(rate,)| rate))
    }

    /// 환율을 저장합니다.
    pub async fn insert(&self, record: &FxRateRecord) -> Result<()> {
        sqlx::query("INSERT INTO fx_rates (base, date, rate) VALUES ($1, $2, $3)")
            .bind(&record.base)
            .bind(record.date)
            .bind(record.rate)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

// =============================================================================
// Symbol Mapping Repository
// =============================================================================

/// 매니저-터미널 심볼 매핑 레코드.
#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct SymbolMappingRecord {
    pub manager_id: String,
    pub terminal_id: String,
    pub manager_symbol: String,
    pub terminal_symbol: String,
}

/// 심볼 매핑 repository.
pub struct SymbolMappingRepository {
    db: Database,
}

impl SymbolMappingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// (manager_id, terminal_id) 키의 매핑 목록을 조회합니다.
    pub async fn list(
        &self,
        manager_id: &str,
        terminal_id: &str,
    ) -> Result<Vec<SymbolMappingRecord>> {
        sqlx::query_as(
            r#"
            SELECT * FROM symbol_mappings
            WHERE manager_id = $1 AND terminal_id = $2
            ORDER BY manager_symbol
            "#,
        )
        .bind(manager_id)
        .bind(terminal_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(Into::into)
    }

    /// 키의 매핑을 통째로 교체합니다.
    pub async fn replace(
        &self,
        manager_id: &str,
        terminal_id: &str,
        pairs: &[(String, String)],
    ) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM symbol_mappings WHERE manager_id = $1 AND terminal_id = $2")
            .bind(manager_id)
            .bind(terminal_id)
            .execute(&mut *tx)
            .await?;

        for (manager_symbol, terminal_symbol) in pairs {
            sqlx::query(
                r#"
                INSERT INTO symbol_mappings (manager_id, terminal_id, manager_symbol, terminal_symbol)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(manager_id)
            .bind(terminal_id)
            .bind(manager_symbol)
            .bind(terminal_symbol)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(manager_id, terminal_id, count = pairs.len(), "Symbol mappings replaced");
        Ok(())
    }
}
