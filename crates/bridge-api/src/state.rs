//! 애플리케이션 상태.
//!
//! 모든 핸들러가 공유하는 상태를 정의합니다. 세션 레지스트리는 필수이며,
//! 데이터베이스와 PnL 엔진은 배포에 따라 없을 수 있습니다.

use std::sync::Arc;

use bridge_core::AppConfig;
use bridge_data::{
    Database, FxRateRepository, GroupConfigRepository, ManagerDealRepository,
    SymbolConfigRepository, SymbolMappingRepository, TerminalFillRepository,
};
use bridge_gateway::SessionRegistry;
use bridge_pnl::{PnlEngine, RepositoryConfigSource};
use chrono::{DateTime, Utc};

/// 공유 애플리케이션 상태.
pub struct AppState {
    /// 게이트웨이 세션 레지스트리
    pub registry: Arc<SessionRegistry>,
    /// 애플리케이션 설정
    pub config: AppConfig,
    /// 데이터베이스 연결 (선택적)
    pub database: Option<Database>,
    /// 심볼 매핑 repository (DB 설정 시)
    pub mappings: Option<SymbolMappingRepository>,
    /// PnL 엔진 (DB 설정 시)
    pub pnl: Option<Arc<PnlEngine>>,
    /// API 버전
    pub version: String,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// 데이터베이스 없는 상태를 생성합니다.
    pub fn new(registry: Arc<SessionRegistry>, config: AppConfig) -> Self {
        Self {
            registry,
            config,
            database: None,
            mappings: None,
            pnl: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 데이터베이스 연결을 붙이고 repository 와 PnL 엔진을 구성합니다.
    #[must_use]
    pub fn with_database(mut self, db: Database) -> Self {
        let deals = Arc::new(ManagerDealRepository::new(db.clone()));
        let fills = Arc::new(TerminalFillRepository::new(db.clone()));
        let configs = Arc::new(RepositoryConfigSource {
            groups: GroupConfigRepository::new(db.clone()),
            symbols: SymbolConfigRepository::new(db.clone()),
        });
        let fx = Arc::new(FxRateRepository::new(db.clone()));

        self.pnl = Some(Arc::new(PnlEngine::new(deals, fills, configs, fx)));
        self.mappings = Some(SymbolMappingRepository::new(db.clone()));
        self.database = Some(db);
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.database {
            Some(db) => db.health_check().await.unwrap_or(false),
            None => false,
        }
    }
}
