//! 게이트웨이 세션 관리 endpoint.
//!
//! 세션 연결/목록/해제를 제공합니다. 연결은 멱등하며, 이미 연결된
//! 세션에 대한 재요청은 `already_connected` 로 보고됩니다.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use bridge_gateway::{ConnectionState, ManagerCredentials, SessionSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{bridge_error_response, ApiResult};
use crate::state::AppState;

/// 연결 요청 파라미터.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// 트레이드 서버 주소
    pub server: String,
    /// 매니저 로그인
    pub login: u64,
    /// 매니저 비밀번호
    pub password: String,
}

/// 연결 응답.
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    /// 세션 식별자
    pub identifier: String,
    /// 연결 후 상태
    pub state: ConnectionState,
    /// 요청 이전에 이미 연결되어 있었는지
    pub already_connected: bool,
}

/// 세션 목록 응답.
#[derive(Debug, Serialize)]
pub struct AccountsListResponse {
    /// 세션 수
    pub count: usize,
    /// 세션 요약 목록
    pub sessions: Vec<SessionSummary>,
}

/// 해제 응답.
#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    /// 세션 식별자
    pub identifier: String,
    /// 살아 있는 연결을 실제로 끊었는지
    pub was_live: bool,
}

/// 세션을 만들고 트레이드 서버에 연결합니다.
///
/// POST /api/v1/accounts/{identifier}/connect
pub async fn connect_account(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConnectParams>,
) -> ApiResult<Json<ConnectResponse>> {
    let credentials = ManagerCredentials {
        server: params.server,
        login: params.login,
        password: params.password.into(),
    };

    let session = state.registry.get_or_create(&identifier, credentials);
    let already_connected = session.state() == ConnectionState::Connected;

    if !already_connected {
        session.connect().await.map_err(bridge_error_response)?;
    }

    Ok(Json(ConnectResponse {
        identifier,
        state: session.state(),
        already_connected,
    }))
}

/// 등록된 세션 목록을 반환합니다.
///
/// GET /api/v1/accounts
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> Json<AccountsListResponse> {
    let sessions = state.registry.list();
    Json(AccountsListResponse {
        count: sessions.len(),
        sessions,
    })
}

/// 세션을 해제하고 레지스트리에서 제거합니다.
///
/// DELETE /api/v1/accounts/{identifier}
pub async fn remove_account(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DisconnectResponse>> {
    let was_live = state
        .registry
        .remove(&identifier)
        .await
        .map_err(bridge_error_response)?;

    Ok(Json(DisconnectResponse {
        identifier,
        was_live,
    }))
}

/// 세션 관리 라우터 생성.
pub fn accounts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_accounts))
        .route("/{identifier}/connect", post(connect_account))
        .route("/{identifier}", delete(remove_account))
}
