//! 라이브 스트림 팬아웃.
//!
//! 세션당 스트림 종류별 펌프 태스크 하나가 주기적으로 배치를 만들어
//! `tokio::sync::broadcast` 채널로 모든 구독자에게 전달합니다.
//! 느리거나 닫힌 수신자는 자신에게만 영향을 줍니다. 펌프는 구독자가
//! 없어지거나 세션이 Connected 를 벗어나면 멈춥니다.

use crate::normalize::normalize_position;
use crate::session::{ConnectionState, Session};
use bridge_core::{Deal, Position};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 세션별 브로드캐스트 허브.
pub struct FanoutHub {
    deals_tx: broadcast::Sender<Arc<Vec<Deal>>>,
    positions_tx: broadcast::Sender<Arc<Vec<Position>>>,
    deals_pump_running: Mutex<bool>,
    positions_pump_running: Mutex<bool>,
    cancel: Mutex<CancellationToken>,
}

impl FanoutHub {
    /// 주어진 채널 용량으로 허브를 생성합니다.
    pub fn new(capacity: usize) -> Self {
        let (deals_tx, _) = broadcast::channel(capacity);
        let (positions_tx, _) = broadcast::channel(capacity);
        Self {
            deals_tx,
            positions_tx,
            deals_pump_running: Mutex::new(false),
            positions_pump_running: Mutex::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// 체결 스트림 수신자를 만듭니다.
    pub fn deals_receiver(&self) -> broadcast::Receiver<Arc<Vec<Deal>>> {
        self.deals_tx.subscribe()
    }

    /// 포지션 스트림 수신자를 만듭니다.
    pub fn positions_receiver(&self) -> broadcast::Receiver<Arc<Vec<Position>>> {
        self.positions_tx.subscribe()
    }

    /// 현재 체결 구독자 수.
    pub fn deals_subscriber_count(&self) -> usize {
        self.deals_tx.receiver_count()
    }

    /// 실행 중인 펌프를 모두 취소하고 다음 연결을 위한 토큰을 준비합니다.
    pub(crate) fn cancel_pumps(&self) {
        let mut cancel = lock(&self.cancel);
        cancel.cancel();
        *cancel = CancellationToken::new();
    }

    fn pump_token(&self) -> CancellationToken {
        lock(&self.cancel).clone()
    }

    fn claim_pump(flag: &Mutex<bool>) -> bool {
        let mut running = lock(flag);
        if *running {
            false
        } else {
            *running = true;
            true
        }
    }

    /// 구독자가 없을 때만 펌프를 내립니다.
    ///
    /// 새 구독자는 수신자를 먼저 만든 뒤 펌프 플래그를 확인하므로,
    /// 이 확인과 플래그 해제를 같은 락 아래에서 하면 구독자가 펌프
    /// 없이 남는 경합이 생기지 않습니다.
    fn release_pump_if_idle(flag: &Mutex<bool>, receiver_count: usize) -> bool {
        let mut running = lock(flag);
        if receiver_count > 0 {
            false
        } else {
            *running = false;
            true
        }
    }

    fn release_pump(flag: &Mutex<bool>) {
        *lock(flag) = false;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// 체결 펌프가 실행 중이 아니면 시작합니다.
pub(crate) fn ensure_deals_pump(session: &Arc<Session>) {
    let hub = session.hub();
    if !FanoutHub::claim_pump(&hub.deals_pump_running) {
        return;
    }

    let session = session.clone();
    let token = hub.pump_token();
    task::spawn(async move {
        let poll_ms = session.config().poll_interval_ms;
        let mut ticker = interval(Duration::from_millis(poll_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!(session = %session.identifier(), "Deals pump started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    FanoutHub::release_pump(&session.hub().deals_pump_running);
                    break;
                }
                _ = ticker.tick() => {}
            }

            let hub = session.hub();
            if session.state() != ConnectionState::Connected {
                FanoutHub::release_pump(&hub.deals_pump_running);
                break;
            }
            if FanoutHub::release_pump_if_idle(
                &hub.deals_pump_running,
                hub.deals_tx.receiver_count(),
            ) {
                break;
            }

            let batch = session.drain_deals();
            if !batch.is_empty() {
                let _ = hub.deals_tx.send(Arc::new(batch));
            }
        }

        tracing::debug!(session = %session.identifier(), "Deals pump stopped");
    });
}

/// 포지션 펌프가 실행 중이 아니면 시작합니다.
pub(crate) fn ensure_positions_pump(session: &Arc<Session>) {
    let hub = session.hub();
    if !FanoutHub::claim_pump(&hub.positions_pump_running) {
        return;
    }

    let session = session.clone();
    let token = hub.pump_token();
    task::spawn(async move {
        let poll_ms = session.config().poll_interval_ms;
        let mut ticker = interval(Duration::from_millis(poll_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!(session = %session.identifier(), "Positions pump started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    FanoutHub::release_pump(&session.hub().positions_pump_running);
                    break;
                }
                _ = ticker.tick() => {}
            }

            let hub = session.hub();
            if session.state() != ConnectionState::Connected {
                FanoutHub::release_pump(&hub.positions_pump_running);
                break;
            }
            if FanoutHub::release_pump_if_idle(
                &hub.positions_pump_running,
                hub.positions_tx.receiver_count(),
            ) {
                break;
            }

            let api = session.api();
            let fetched = task::spawn_blocking(move || {
                api.position_request()
                    .ok_or_else(|| api.last_error())
            })
            .await;

            match fetched {
                Ok(Ok(raws)) => {
                    let snapshot: Vec<Position> =
                        raws.into_iter().map(normalize_position).collect();
                    // 포지션은 스냅샷이므로 빈 목록도 의미가 있다
                    let _ = hub.positions_tx.send(Arc::new(snapshot));
                }
                Ok(Err(error)) => {
                    tracing::warn!(session = %session.identifier(), %error, "Position poll failed");
                }
                Err(error) => {
                    tracing::warn!(session = %session.identifier(), %error, "Position poll worker panicked");
                }
            }
        }

        tracing::debug!(session = %session.identifier(), "Positions pump stopped");
    });
}
