//! 과거 체결 조회 퍼사드.
//!
//! 상태 없는 조회 계층입니다. 모든 조회는 연결을 보장한 뒤
//! `spawn_blocking` 에서 실행되고, `None` 센티널은 즉시 회수한
//! `last_error` 와 함께 `QueryFailure` 로 변환됩니다. 입력 파싱은
//! 어떤 외부 호출보다도 먼저 수행됩니다.

use crate::error::{GatewayError, GatewayResult};
use crate::normalize::normalize_deal;
use crate::session::Session;
use crate::traits::{ManagerApi, RawDeal};
use bridge_core::{BridgeResult, Deal};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task;

/// 쉼표로 구분된 로그인 목록을 파싱합니다.
///
/// 빈 목록, 빈 항목, 숫자가 아닌 항목은 모두 거부됩니다.
pub fn parse_logins(input: &str) -> GatewayResult<Vec<u64>> {
    parse_id_list(input, "logins")
}

/// 쉼표로 구분된 티켓 목록을 파싱합니다.
pub fn parse_tickets(input: &str) -> GatewayResult<Vec<u64>> {
    parse_id_list(input, "tickets")
}

fn parse_id_list(input: &str, field: &str) -> GatewayResult<Vec<u64>> {
    if input.trim().is_empty() {
        return Err(GatewayError::InvalidInput(format!("{} is empty", field)));
    }

    input
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            entry.parse::<u64>().map_err(|_| {
                GatewayError::InvalidInput(format!("invalid {} entry: '{}'", field, entry))
            })
        })
        .collect()
}

fn require_non_empty(value: &str, field: &str) -> GatewayResult<()> {
    if value.trim().is_empty() {
        Err(GatewayError::InvalidInput(format!("{} is empty", field)))
    } else {
        Ok(())
    }
}

async fn run_deal_query<F>(session: &Session, query: F) -> BridgeResult<Vec<Deal>>
where
    F: FnOnce(&dyn ManagerApi) -> Option<Vec<RawDeal>> + Send + 'static,
{
    session.ensure_connected().await?;

    let api = session.api();
    let result = task::spawn_blocking(move || {
        // 실패 직후의 last_error 만 유효하다
        query(api.as_ref()).ok_or_else(|| api.last_error())
    })
    .await;

    match result {
        Ok(Ok(raws)) => Ok(raws.into_iter().map(normalize_deal).collect()),
        Ok(Err(error)) => Err(GatewayError::QueryFailed(error).into()),
        Err(error) => Err(GatewayError::QueryFailed(error.to_string()).into()),
    }
}

/// 그룹 마스크 + 기간으로 체결을 조회합니다.
pub async fn deals_by_group(
    session: &Arc<Session>,
    groups: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> BridgeResult<Vec<Deal>> {
    require_non_empty(groups, "groups")?;
    let groups = groups.to_string();
    let (from, to) = (from.timestamp(), to.timestamp());
    run_deal_query(session, move |api| api.deal_request_by_group(&groups, from, to)).await
}

/// 그룹 마스크 + 심볼 + 기간으로 체결을 조회합니다.
pub async fn deals_by_group_symbol(
    session: &Arc<Session>,
    groups: &str,
    symbol: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> BridgeResult<Vec<Deal>> {
    require_non_empty(groups, "groups")?;
    require_non_empty(symbol, "symbol")?;
    let (groups, symbol) = (groups.to_string(), symbol.to_string());
    let (from, to) = (from.timestamp(), to.timestamp());
    run_deal_query(session, move |api| {
        api.deal_request_by_group_symbol(&groups, &symbol, from, to)
    })
    .await
}

/// 로그인 목록 + 기간으로 체결을 조회합니다.
pub async fn deals_by_logins(
    session: &Arc<Session>,
    logins: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> BridgeResult<Vec<Deal>> {
    let logins = parse_logins(logins)?;
    let (from, to) = (from.timestamp(), to.timestamp());
    run_deal_query(session, move |api| {
        api.deal_request_by_logins(&logins, from, to)
    })
    .await
}

/// 로그인 목록 + 심볼 + 기간으로 체결을 조회합니다.
pub async fn deals_by_logins_symbol(
    session: &Arc<Session>,
    logins: &str,
    symbol: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> BridgeResult<Vec<Deal>> {
    let logins = parse_logins(logins)?;
    require_non_empty(symbol, "symbol")?;
    let symbol = symbol.to_string();
    let (from, to) = (from.timestamp(), to.timestamp());
    run_deal_query(session, move |api| {
        api.deal_request_by_logins_symbol(&logins, &symbol, from, to)
    })
    .await
}

/// 티켓 목록으로 체결을 조회합니다 (기간 없음).
pub async fn deals_by_tickets(session: &Arc<Session>, tickets: &str) -> BridgeResult<Vec<Deal>> {
    let tickets = parse_tickets(tickets)?;
    run_deal_query(session, move |api| api.deal_request_by_tickets(&tickets)).await
}

/// 단일 로그인의 체결을 페이지 단위로 조회합니다.
pub async fn deals_page(
    session: &Arc<Session>,
    login: u64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    offset: u32,
    total: u32,
) -> BridgeResult<Vec<Deal>> {
    if total == 0 {
        return Err(GatewayError::InvalidInput("total must be positive".to_string()).into());
    }
    let (from, to) = (from.timestamp(), to.timestamp());
    run_deal_query(session, move |api| {
        api.deal_request_page(login, from, to, offset, total)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_logins_valid() {
        assert_eq!(parse_logins("1001,1002, 1003").unwrap(), vec![1001, 1002, 1003]);
        assert_eq!(parse_logins("42").unwrap(), vec![42]);
    }

    #[test]
    fn test_parse_logins_rejects_bad_input() {
        assert!(parse_logins("").is_err());
        assert!(parse_logins("  ").is_err());
        assert!(parse_logins("1001,,1002").is_err());
        assert!(parse_logins("1001,abc").is_err());
        assert!(parse_logins("-5").is_err());
    }

    #[test]
    fn test_parse_tickets_error_names_field() {
        let err = parse_tickets("12,x").unwrap_err();
        assert!(err.to_string().contains("tickets"));
    }
}
