//! 매니저 브리지 API 서버.
//!
//! Axum 기반 REST/WebSocket 서버를 시작합니다. 게이트웨이 세션 관리,
//! 체결/포지션 조회, 심볼 매핑, PnL 엔드포인트를 제공합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use bridge_api::routes::create_api_router;
use bridge_api::state::AppState;
use bridge_api::websocket::websocket_router;
use bridge_core::{init_logging, AppConfig, LogConfig, LogFormat};
use bridge_data::Database;
use bridge_gateway::{ManagerApi, ManagerCredentials, SessionRegistry, SimulatedManagerApi};

/// 세션별 SDK 인스턴스 팩토리.
///
/// 실제 SDK 바인딩이 준비되면 이 함수만 교체하면 됩니다. 지금은
/// 시뮬레이션 SDK 가 꽂혀 있어 개발/테스트 배포에서 바로 동작합니다.
fn manager_api_factory(_credentials: &ManagerCredentials) -> Arc<dyn ManagerApi> {
    Arc::new(SimulatedManagerApi::new())
}

/// CORS 미들웨어 구성.
///
/// `CORS_ORIGINS` 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// AppState 초기화.
///
/// 데이터베이스 연결에 실패하면 DB 의존 기능만 비활성화하고
/// 게이트웨이 기능은 그대로 제공합니다.
async fn create_app_state(config: AppConfig) -> AppState {
    let registry = Arc::new(SessionRegistry::new(
        Arc::new(manager_api_factory),
        config.gateway.clone(),
    ));

    let mut state = AppState::new(registry, config);

    if state.config.database.url.is_empty() {
        warn!("Database URL not set, database features will be disabled");
        return state;
    }

    match Database::connect(&state.config.database).await {
        Ok(db) => match db.migrate().await {
            Ok(()) => {
                info!("Connected to Postgres and ran migrations");
                state = state.with_database(db);
            }
            Err(e) => {
                error!("Failed to run migrations: {}", e);
            }
        },
        Err(e) => {
            error!("Failed to connect to database: {}", e);
        }
    }

    state
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_api_router())
        .nest("/ws", websocket_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 설정 로드
    let config = AppConfig::load_default()?;

    // tracing 초기화
    let log_format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or(LogFormat::Pretty);
    init_logging(LogConfig::new(config.logging.level.clone()).with_format(log_format))?;

    info!("Starting manager bridge API server...");

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // AppState 생성 (레지스트리 + 선택적 DB)
    let state = Arc::new(create_app_state(config).await);

    info!(version = %state.version, "Application state initialized");
    info!(
        has_db = state.database.is_some(),
        has_pnl = state.pnl.is_some(),
        sessions = state.registry.len(),
        "Service connections status"
    );

    // 전역 종료 토큰 (백그라운드 태스크 전파용)
    let shutdown_token = CancellationToken::new();

    let app = create_router(state);

    info!(%addr, "API server listening");
    info!("WebSocket available at ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    // 진행 중인 팬아웃 펌프 정리 대기
    tokio::time::sleep(Duration::from_millis(500)).await;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
