//! WebSocket 스트리밍 endpoint.
//!
//! 세션의 팬아웃 허브를 구독하여 체결 배치와 포지션 스냅샷을
//! JSON 프레임으로 전달합니다. 알 수 없는 식별자는 업그레이드를
//! 수락한 뒤 정책 코드(1008)로 닫습니다. 클라이언트 메시지는
//! close 외에 모두 무시됩니다 (ping/pong 은 axum 이 처리).

use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// WebSocket 라우터 생성.
///
/// `/ws` 아래에 중첩됩니다.
pub fn websocket_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deals/{identifier}", get(deals_stream))
        .route("/positions/{identifier}", get(positions_stream))
}

/// 라이브 체결 스트림 업그레이드 핸들러.
///
/// GET /ws/deals/{identifier}
pub async fn deals_stream(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_deals(socket, state, identifier))
}

/// 라이브 포지션 스냅샷 스트림 업그레이드 핸들러.
///
/// GET /ws/positions/{identifier}
pub async fn positions_stream(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_positions(socket, state, identifier))
}

async fn handle_deals(socket: WebSocket, state: Arc<AppState>, identifier: String) {
    let session = match state.registry.get(&identifier) {
        Ok(session) => session,
        Err(_) => {
            close_with_policy(socket, "unknown session").await;
            return;
        }
    };

    let receiver = match session.subscribe_deals().await {
        Ok(receiver) => receiver,
        Err(error) => {
            warn!(session = %identifier, %error, "Deal stream subscribe failed");
            close_with_error(socket, error.to_string()).await;
            return;
        }
    };

    forward_batches(socket, receiver, "deals", identifier).await;
}

async fn handle_positions(socket: WebSocket, state: Arc<AppState>, identifier: String) {
    let session = match state.registry.get(&identifier) {
        Ok(session) => session,
        Err(_) => {
            close_with_policy(socket, "unknown session").await;
            return;
        }
    };

    let receiver = match session.subscribe_positions().await {
        Ok(receiver) => receiver,
        Err(error) => {
            warn!(session = %identifier, %error, "Position stream subscribe failed");
            close_with_error(socket, error.to_string()).await;
            return;
        }
    };

    forward_batches(socket, receiver, "positions", identifier).await;
}

/// 브로드캐스트 배치를 JSON 프레임으로 전달합니다.
///
/// 클라이언트가 끊거나 허브가 닫힐 때까지 돕니다. 느린 소비자가
/// 배치를 놓치면 경고만 남기고 계속합니다.
async fn forward_batches<T: Serialize>(
    socket: WebSocket,
    mut batches: broadcast::Receiver<Arc<Vec<T>>>,
    field: &'static str,
    identifier: String,
) {
    let connection_id = uuid::Uuid::new_v4();
    info!(session = %identifier, %connection_id, stream = field, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            batch = batches.recv() => match batch {
                Ok(batch) => {
                    let frame = serde_json::json!({ field: &*batch });
                    if sender
                        .send(Message::Text(frame.to_string().into()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(session = %identifier, %connection_id, skipped, "WebSocket lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            closed = client_closed(&mut receiver) => {
                if closed {
                    break;
                }
            }
        }
    }

    info!(session = %identifier, %connection_id, stream = field, "WebSocket disconnected");
}

/// 클라이언트 쪽 프레임을 하나 소비합니다.
///
/// close 또는 소켓 종료면 `true`, 그 외 메시지는 무시하고 `false`.
async fn client_closed(receiver: &mut SplitStream<WebSocket>) -> bool {
    match receiver.next().await {
        Some(Ok(Message::Close(_))) | None => true,
        Some(Ok(other)) => {
            debug!(?other, "Ignoring client message");
            false
        }
        Some(Err(_)) => true,
    }
}

async fn close_with_policy(mut socket: WebSocket, reason: &str) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: reason.to_string().into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

async fn close_with_error(mut socket: WebSocket, reason: String) {
    let frame = CloseFrame {
        code: close_code::ERROR,
        reason: reason.into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}
