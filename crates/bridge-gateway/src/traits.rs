//! 매니저 SDK 경계 trait 정의.
//!
//! 외부 매니저 SDK의 호출 규약을 그대로 반영합니다:
//! - 모든 호출은 블로킹이며 SDK 소유 스레드에서 실행되어야 합니다
//!   (비동기 코드에서는 반드시 `spawn_blocking` 으로 감쌉니다).
//! - 실패는 falsy 센티널(`false` / `None`)로 표현되고, 에러 내용은
//!   별도의 `last_error()` 로 조회합니다. 에러 문자열은 다음 호출이
//!   덮어쓰므로 실패한 호출 직후에 즉시 가져와야 합니다.
//! - `None` 은 외부 에러, `Some(vec![])` 은 정상적인 빈 결과입니다.

use secrecy::SecretString;
use std::sync::Arc;

/// 세션 자격증명.
#[derive(Debug, Clone)]
pub struct ManagerCredentials {
    /// 트레이드 서버 주소 (예: "203.0.113.1:443")
    pub server: String,
    /// 매니저 로그인
    pub login: u64,
    /// 매니저 비밀번호
    pub password: SecretString,
}

/// 원시 체결 레코드 (SDK 와이어 표현).
///
/// 열거 필드는 숫자 코드 그대로, 시각은 유닉스 초/밀리초 그대로입니다.
/// 도메인 타입으로의 변환은 `normalize` 모듈이 단일 지점에서 수행합니다.
#[derive(Debug, Clone, Default)]
pub struct RawDeal {
    pub ticket: u64,
    pub login: u64,
    pub order: u64,
    pub external_id: String,
    pub dealer: u64,
    pub action: u32,
    pub entry: u32,
    pub reason: u32,
    pub digits: u32,
    pub contract_size: f64,
    pub time: i64,
    pub time_msc: i64,
    pub symbol: String,
    pub price: f64,
    pub price_sl: f64,
    pub price_tp: f64,
    pub price_position: f64,
    pub price_gateway: f64,
    pub volume: f64,
    pub volume_closed: f64,
    pub profit: f64,
    pub storage: f64,
    pub commission: f64,
    pub fee: f64,
    pub rate_profit: f64,
    pub rate_margin: f64,
    pub expert_id: u64,
    pub position_id: u64,
    pub comment: String,
    pub gateway: String,
    pub market_bid: f64,
    pub market_ask: f64,
    pub market_last: f64,
    pub modification_flags: u32,
}

/// 원시 포지션 레코드.
#[derive(Debug, Clone, Default)]
pub struct RawPosition {
    pub ticket: u64,
    pub login: u64,
    pub symbol: String,
    pub action: u32,
    pub volume: f64,
    pub price_open: f64,
    pub price_current: f64,
    pub profit: f64,
    pub time_create: i64,
}

/// 원시 수수료 구간.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTier {
    pub range_from: f64,
    pub range_to: f64,
    pub value: f64,
}

/// 원시 수수료 설정.
#[derive(Debug, Clone, Default)]
pub struct RawCommission {
    pub name: String,
    pub path: String,
    pub tiers: Vec<RawTier>,
}

/// 원시 그룹별 심볼 설정.
#[derive(Debug, Clone, Default)]
pub struct RawGroupSymbol {
    pub path: String,
    pub swap_long: f64,
    pub swap_short: f64,
    pub spread_diff: i32,
}

/// 원시 그룹 레코드.
#[derive(Debug, Clone, Default)]
pub struct RawGroup {
    pub group: String,
    pub server: u64,
    pub company: String,
    pub currency: String,
    pub leverage: u32,
    pub commissions: Vec<RawCommission>,
    pub symbols: Vec<RawGroupSymbol>,
}

/// 원시 심볼 레코드.
#[derive(Debug, Clone, Default)]
pub struct RawSymbolInfo {
    pub symbol: String,
    pub path: String,
    pub description: String,
    pub currency_base: String,
    pub currency_profit: String,
    pub contract_size: f64,
    pub digits: u32,
    pub point: f64,
    pub swap_long: f64,
    pub swap_short: f64,
}

/// 원시 계정 레코드.
#[derive(Debug, Clone, Default)]
pub struct RawUser {
    pub login: u64,
    pub group: String,
    pub name: String,
    pub leverage: u32,
    pub balance: f64,
    pub credit: f64,
    pub registration: i64,
}

/// 라이브 체결 이벤트 수신자.
///
/// SDK 가 소유한 스레드에서 호출되므로 구현은 블로킹 없이 빠르게
/// 반환해야 합니다. add 외의 이벤트는 기본적으로 무시됩니다.
pub trait DealSink: Send + Sync {
    /// 새 체결 추가.
    fn on_deal_add(&self, deal: RawDeal);

    /// 체결 갱신.
    fn on_deal_update(&self, _deal: RawDeal) {}

    /// 체결 삭제.
    fn on_deal_delete(&self, _deal: RawDeal) {}

    /// 체결 동기화 시작.
    fn on_deal_sync(&self) {}

    /// 일괄 처리 완료.
    fn on_deal_perform(&self) {}
}

/// 매니저 SDK 인터페이스.
///
/// 모든 메서드는 블로킹입니다.
pub trait ManagerApi: Send + Sync {
    /// 트레이드 서버에 연결합니다. 성공 시 `true`.
    ///
    /// `pump_mode` 는 서버 푸시(라이브 이벤트) 수신 여부를 결정합니다.
    fn connect(
        &self,
        server: &str,
        login: u64,
        password: &str,
        pump_mode: bool,
        timeout_ms: u64,
    ) -> bool;

    /// 연결을 해제합니다.
    fn disconnect(&self) -> bool;

    /// 마지막 호출의 에러 문자열. 다음 호출이 덮어씁니다.
    fn last_error(&self) -> String;

    /// 라이브 체결 스트림을 구독합니다. 성공 시 `true`.
    fn deal_subscribe(&self, sink: Arc<dyn DealSink>) -> bool;

    // === 체결 조회 ===

    /// 그룹 마스크 + 기간으로 체결 조회.
    fn deal_request_by_group(&self, groups: &str, from: i64, to: i64) -> Option<Vec<RawDeal>>;

    /// 그룹 마스크 + 심볼 + 기간으로 체결 조회.
    fn deal_request_by_group_symbol(
        &self,
        groups: &str,
        symbol: &str,
        from: i64,
        to: i64,
    ) -> Option<Vec<RawDeal>>;

    /// 로그인 목록 + 기간으로 체결 조회.
    fn deal_request_by_logins(&self, logins: &[u64], from: i64, to: i64) -> Option<Vec<RawDeal>>;

    /// 로그인 목록 + 심볼 + 기간으로 체결 조회.
    fn deal_request_by_logins_symbol(
        &self,
        logins: &[u64],
        symbol: &str,
        from: i64,
        to: i64,
    ) -> Option<Vec<RawDeal>>;

    /// 티켓 목록으로 체결 조회 (기간 없음).
    fn deal_request_by_tickets(&self, tickets: &[u64]) -> Option<Vec<RawDeal>>;

    /// 단일 로그인 + 기간 페이지 조회.
    fn deal_request_page(
        &self,
        login: u64,
        from: i64,
        to: i64,
        offset: u32,
        total: u32,
    ) -> Option<Vec<RawDeal>>;

    // === 스냅샷 조회 ===

    /// 서버의 전체 오픈 포지션 조회.
    fn position_request(&self) -> Option<Vec<RawPosition>>;

    /// 전체 그룹 설정 조회.
    fn group_request_array(&self) -> Option<Vec<RawGroup>>;

    /// 전체 심볼 설정 조회.
    fn symbol_request_array(&self) -> Option<Vec<RawSymbolInfo>>;

    /// 그룹 마스크로 계정 조회.
    fn user_request_by_group(&self, mask: &str) -> Option<Vec<RawUser>>;
}
