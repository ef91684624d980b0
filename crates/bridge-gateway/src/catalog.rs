//! 그룹/심볼/계정 카탈로그 조회.
//!
//! 퍼사드와 같은 호출 규약을 따릅니다: 연결 보장 후 `spawn_blocking`,
//! `None` 센티널은 `QueryFailure(last_error)` 로 변환.

use crate::error::GatewayError;
use crate::normalize::{normalize_group, normalize_position, normalize_symbol, normalize_user};
use crate::session::Session;
use crate::traits::ManagerApi;
use bridge_core::{BridgeResult, GroupSnapshot, Position, SymbolInfo, UserRecord};
use std::sync::Arc;
use tokio::task;

async fn run_query<T, R, F, M>(session: &Session, query: F, map: M) -> BridgeResult<Vec<T>>
where
    R: Send + 'static,
    F: FnOnce(&dyn ManagerApi) -> Option<Vec<R>> + Send + 'static,
    M: Fn(R) -> T,
{
    session.ensure_connected().await?;

    let api = session.api();
    let result = task::spawn_blocking(move || query(api.as_ref()).ok_or_else(|| api.last_error()))
        .await;

    match result {
        Ok(Ok(raws)) => Ok(raws.into_iter().map(map).collect()),
        Ok(Err(error)) => Err(GatewayError::QueryFailed(error).into()),
        Err(error) => Err(GatewayError::QueryFailed(error.to_string()).into()),
    }
}

/// 전체 그룹 설정을 조회합니다 (수수료 구간 정렬 포함).
pub async fn group_configurations(session: &Arc<Session>) -> BridgeResult<Vec<GroupSnapshot>> {
    run_query(session, |api| api.group_request_array(), normalize_group).await
}

/// 전체 심볼 설정을 조회합니다.
pub async fn symbol_configurations(session: &Arc<Session>) -> BridgeResult<Vec<SymbolInfo>> {
    run_query(session, |api| api.symbol_request_array(), normalize_symbol).await
}

/// 그룹 마스크로 계정 목록을 조회합니다.
pub async fn users_by_group(session: &Arc<Session>, mask: &str) -> BridgeResult<Vec<UserRecord>> {
    if mask.trim().is_empty() {
        return Err(GatewayError::InvalidInput("group mask is empty".to_string()).into());
    }
    let mask = mask.to_string();
    run_query(
        session,
        move |api| api.user_request_by_group(&mask),
        normalize_user,
    )
    .await
}

/// 현재 오픈 포지션 스냅샷을 조회합니다.
pub async fn latest_positions(session: &Arc<Session>) -> BridgeResult<Vec<Position>> {
    run_query(session, |api| api.position_request(), normalize_position).await
}
