//! 게이트웨이 세션 및 연결 수명주기.

use crate::error::GatewayError;
use crate::fanout::FanoutHub;
use crate::sink::{BufferSink, DealBuffer};
use crate::traits::{ManagerApi, ManagerCredentials};
use bridge_core::{BridgeResult, Deal, GatewayConfig, Position};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot};
use tokio::task;
use tokio::time::{timeout, Duration};

/// 세션 연결 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// 연결되지 않음
    Disconnected,
    /// 핸드셰이크 진행 중
    Connecting,
    /// 연결됨
    Connected,
}

/// 세션 목록 조회용 요약.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// 세션 식별자
    pub identifier: String,
    /// 트레이드 서버 주소
    pub server: String,
    /// 매니저 로그인
    pub login: u64,
    /// 연결 상태
    pub state: ConnectionState,
    /// 세션 생성 시각
    pub created_at: DateTime<Utc>,
}

/// 단일 게이트웨이 연결 세션.
///
/// `SessionRegistry` 가 식별자당 하나씩 소유합니다. 연결/해제는
/// 세션별 비동기 뮤텍스로 직렬화되며, 둘 다 멱등합니다.
pub struct Session {
    identifier: String,
    credentials: ManagerCredentials,
    api: Arc<dyn ManagerApi>,
    config: GatewayConfig,
    state: Mutex<ConnectionState>,
    created_at: DateTime<Utc>,
    buffer: Arc<DealBuffer>,
    hub: FanoutHub,
    // connect/disconnect 직렬화
    lifecycle: tokio::sync::Mutex<()>,
    // 연결당 한 번의 외부 deal_subscribe
    deal_subscription: tokio::sync::Mutex<bool>,
}

impl Session {
    /// 새 세션을 생성합니다 (연결되지 않은 상태).
    pub fn new(
        identifier: impl Into<String>,
        credentials: ManagerCredentials,
        api: Arc<dyn ManagerApi>,
        config: GatewayConfig,
    ) -> Arc<Self> {
        let hub = FanoutHub::new(config.channel_capacity);
        Arc::new(Self {
            identifier: identifier.into(),
            credentials,
            api,
            config,
            state: Mutex::new(ConnectionState::Disconnected),
            created_at: Utc::now(),
            buffer: Arc::new(DealBuffer::new()),
            hub,
            lifecycle: tokio::sync::Mutex::new(()),
            deal_subscription: tokio::sync::Mutex::new(false),
        })
    }

    /// 세션 식별자.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// 현재 연결 상태.
    pub fn state(&self) -> ConnectionState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, next: ConnectionState) {
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// 목록 조회용 요약을 반환합니다.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            identifier: self.identifier.clone(),
            server: self.credentials.server.clone(),
            login: self.credentials.login,
            state: self.state(),
            created_at: self.created_at,
        }
    }

    pub(crate) fn api(&self) -> Arc<dyn ManagerApi> {
        self.api.clone()
    }

    pub(crate) fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(crate) fn hub(&self) -> &FanoutHub {
        &self.hub
    }

    /// 트레이드 서버에 연결합니다.
    ///
    /// 이미 연결되어 있으면 아무것도 하지 않습니다. 블로킹 핸드셰이크는
    /// `spawn_blocking` 에서 실행되며, 설정된 타임아웃을 넘기면
    /// `ConnectionFailure` 로 끝납니다. 타임아웃 이후 뒤늦게 성공한
    /// 핸드셰이크는 스스로 연결을 해제합니다.
    pub async fn connect(&self) -> BridgeResult<()> {
        let _guard = self.lifecycle.lock().await;
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }

        self.set_state(ConnectionState::Connecting);
        tracing::info!(
            session = %self.identifier,
            server = %self.credentials.server,
            login = self.credentials.login,
            "Connecting to trade server"
        );

        let timeout_ms = self.config.connect_timeout_ms;
        let api = self.api.clone();
        let credentials = self.credentials.clone();
        let (done_tx, done_rx) = oneshot::channel::<(bool, String)>();

        task::spawn_blocking(move || {
            let connected = api.connect(
                &credentials.server,
                credentials.login,
                credentials.password.expose_secret(),
                true,
                timeout_ms,
            );
            // 실패 직후에만 유효한 에러 문자열을 바로 회수
            let error = if connected {
                String::new()
            } else {
                api.last_error()
            };

            if done_tx.send((connected, error)).is_err() && connected {
                // 수신자가 타임아웃으로 떠난 고아 연결
                api.disconnect();
            }
        });

        match timeout(Duration::from_millis(timeout_ms), done_rx).await {
            Ok(Ok((true, _))) => {
                self.set_state(ConnectionState::Connected);
                tracing::info!(session = %self.identifier, "Connected");
                Ok(())
            }
            Ok(Ok((false, error))) => {
                self.set_state(ConnectionState::Disconnected);
                tracing::warn!(session = %self.identifier, %error, "Connect failed");
                Err(GatewayError::ConnectFailed(error).into())
            }
            Ok(Err(_)) => {
                self.set_state(ConnectionState::Disconnected);
                Err(GatewayError::WorkerDropped.into())
            }
            Err(_) => {
                self.set_state(ConnectionState::Disconnected);
                tracing::warn!(session = %self.identifier, timeout_ms, "Connect timed out");
                Err(GatewayError::ConnectTimeout(timeout_ms).into())
            }
        }
    }

    /// 연결되어 있지 않으면 연결을 시도합니다.
    pub async fn ensure_connected(&self) -> BridgeResult<()> {
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }
        self.connect().await
    }

    /// 연결을 해제합니다.
    ///
    /// 이미 해제된 세션이면 `false` 를 반환합니다. 팬아웃 펌프는
    /// 취소 토큰과 상태 변화를 통해 멈춥니다.
    pub async fn disconnect(&self) -> bool {
        let _guard = self.lifecycle.lock().await;
        if self.state() == ConnectionState::Disconnected {
            return false;
        }

        self.hub.cancel_pumps();
        *self.deal_subscription.lock().await = false;

        let api = self.api.clone();
        if let Err(error) = task::spawn_blocking(move || api.disconnect()).await {
            tracing::warn!(session = %self.identifier, %error, "Disconnect worker panicked");
        }

        self.set_state(ConnectionState::Disconnected);
        tracing::info!(session = %self.identifier, "Disconnected");
        true
    }

    /// 버퍼에 쌓인 체결을 한 번 비워 반환합니다.
    ///
    /// 연결과 라이브 구독을 먼저 보장하므로, 폴링 클라이언트도
    /// 팬아웃 구독 없이 체결을 수집할 수 있습니다.
    pub async fn latest_deals(&self) -> BridgeResult<Vec<Deal>> {
        self.ensure_connected().await?;
        self.ensure_deal_subscription().await?;
        Ok(self.buffer.drain())
    }

    pub(crate) fn drain_deals(&self) -> Vec<Deal> {
        self.buffer.drain()
    }

    pub(crate) fn buffer(&self) -> Arc<DealBuffer> {
        self.buffer.clone()
    }

    /// 라이브 체결 스트림을 구독합니다.
    ///
    /// 첫 구독자가 외부 `deal_subscribe` 를 한 번 트리거합니다. 구독
    /// 실패 시 구독자는 등록되지 않은 채 에러가 반환됩니다.
    pub async fn subscribe_deals(
        self: &Arc<Self>,
    ) -> BridgeResult<broadcast::Receiver<Arc<Vec<Deal>>>> {
        self.ensure_connected().await?;
        self.ensure_deal_subscription().await?;

        let receiver = self.hub.deals_receiver();
        crate::fanout::ensure_deals_pump(self);
        Ok(receiver)
    }

    /// 라이브 포지션 스냅샷 스트림을 구독합니다.
    pub async fn subscribe_positions(
        self: &Arc<Self>,
    ) -> BridgeResult<broadcast::Receiver<Arc<Vec<Position>>>> {
        self.ensure_connected().await?;

        let receiver = self.hub.positions_receiver();
        crate::fanout::ensure_positions_pump(self);
        Ok(receiver)
    }

    async fn ensure_deal_subscription(&self) -> BridgeResult<()> {
        let mut subscribed = self.deal_subscription.lock().await;
        if *subscribed {
            return Ok(());
        }

        let api = self.api.clone();
        let sink = Arc::new(BufferSink::new(self.identifier.clone(), self.buffer.clone()));
        let result = task::spawn_blocking(move || {
            if api.deal_subscribe(sink) {
                Ok(())
            } else {
                Err(api.last_error())
            }
        })
        .await;

        match result {
            Ok(Ok(())) => {
                *subscribed = true;
                tracing::info!(session = %self.identifier, "Deal stream subscribed");
                Ok(())
            }
            Ok(Err(error)) => {
                tracing::warn!(session = %self.identifier, %error, "Deal subscribe failed");
                Err(GatewayError::SubscribeFailed(error).into())
            }
            Err(error) => Err(GatewayError::SubscribeFailed(error.to_string()).into()),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identifier", &self.identifier)
            .field("server", &self.credentials.server)
            .field("login", &self.credentials.login)
            .field("state", &self.state())
            .finish()
    }
}
