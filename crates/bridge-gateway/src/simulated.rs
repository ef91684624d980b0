//! 시뮬레이션 매니저 SDK.
//!
//! 실제 게이트웨이 없이 세션/퍼사드/팬아웃 전체를 구동하기 위한
//! 인프로세스 `ManagerApi` 구현입니다. 테스트의 실패 주입과
//! 개발 서버 구동에 사용됩니다.

use crate::traits::{
    DealSink, ManagerApi, RawDeal, RawGroup, RawPosition, RawSymbolInfo, RawUser,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 시뮬레이션 동작 설정.
#[derive(Debug, Clone, Default)]
pub struct SimulatedConfig {
    /// 연결을 항상 실패시킴
    pub fail_connect: bool,
    /// 연결 핸드셰이크에 걸리는 시간 (밀리초)
    pub connect_delay_ms: u64,
    /// 구독을 항상 실패시킴
    pub fail_subscribe: bool,
    /// 모든 조회를 실패시킴
    pub fail_queries: bool,
}

/// 스크립트 가능한 시뮬레이션 SDK.
///
/// 실제 SDK 와 같은 호출 규약을 따릅니다: falsy 센티널 + `last_error`,
/// 그리고 `last_error` 는 다음 호출이 덮어씁니다.
#[derive(Default)]
pub struct SimulatedManagerApi {
    config: Mutex<SimulatedConfig>,
    connected: AtomicBool,
    last_error: Mutex<String>,
    sink: Mutex<Option<Arc<dyn DealSink>>>,
    deals: Mutex<Vec<RawDeal>>,
    positions: Mutex<Vec<RawPosition>>,
    groups: Mutex<Vec<RawGroup>>,
    symbols: Mutex<Vec<RawSymbolInfo>>,
    users: Mutex<Vec<RawUser>>,
    connect_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

impl SimulatedManagerApi {
    /// 기본 설정의 시뮬레이션 SDK 를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 동작 설정을 지정해 생성합니다.
    pub fn with_config(config: SimulatedConfig) -> Self {
        Self {
            config: Mutex::new(config),
            ..Self::default()
        }
    }

    /// 조회용 체결을 스크립트합니다.
    pub fn script_deals(&self, deals: Vec<RawDeal>) {
        *lock(&self.deals) = deals;
    }

    /// 포지션 스냅샷을 스크립트합니다.
    pub fn script_positions(&self, positions: Vec<RawPosition>) {
        *lock(&self.positions) = positions;
    }

    /// 그룹 설정을 스크립트합니다.
    pub fn script_groups(&self, groups: Vec<RawGroup>) {
        *lock(&self.groups) = groups;
    }

    /// 심볼 설정을 스크립트합니다.
    pub fn script_symbols(&self, symbols: Vec<RawSymbolInfo>) {
        *lock(&self.symbols) = symbols;
    }

    /// 계정 목록을 스크립트합니다.
    pub fn script_users(&self, users: Vec<RawUser>) {
        *lock(&self.users) = users;
    }

    /// 동작 설정을 바꿉니다.
    pub fn set_config(&self, config: SimulatedConfig) {
        *lock(&self.config) = config;
    }

    /// 라이브 체결 이벤트를 등록된 싱크로 밀어 넣습니다.
    ///
    /// 구독 전이면 아무 일도 일어나지 않고 `false` 를 반환합니다.
    pub fn emit_deal(&self, deal: RawDeal) -> bool {
        let sink = lock(&self.sink).clone();
        match sink {
            Some(sink) => {
                sink.on_deal_add(deal);
                true
            }
            None => false,
        }
    }

    /// 지금까지의 connect 호출 횟수.
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// 지금까지의 deal_subscribe 호출 횟수.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// 현재 연결 여부.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_error(&self, message: impl Into<String>) {
        *lock(&self.last_error) = message.into();
    }

    fn guard_query<T>(&self, result: Vec<T>) -> Option<Vec<T>> {
        if !self.connected.load(Ordering::SeqCst) {
            self.set_error("No connection (6)");
            return None;
        }
        if lock(&self.config).fail_queries {
            self.set_error("Request rejected (12)");
            return None;
        }
        self.set_error("");
        Some(result)
    }

    fn scripted_deals(&self) -> Vec<RawDeal> {
        lock(&self.deals).clone()
    }
}

impl ManagerApi for SimulatedManagerApi {
    fn connect(
        &self,
        _server: &str,
        _login: u64,
        _password: &str,
        _pump_mode: bool,
        _timeout_ms: u64,
    ) -> bool {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        let (fail, delay_ms) = {
            let config = lock(&self.config);
            (config.fail_connect, config.connect_delay_ms)
        };
        if delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(delay_ms));
        }
        if fail {
            self.set_error("Invalid login or password (8)");
            return false;
        }

        self.set_error("");
        self.connected.store(true, Ordering::SeqCst);
        true
    }

    fn disconnect(&self) -> bool {
        self.set_error("");
        *lock(&self.sink) = None;
        self.connected.swap(false, Ordering::SeqCst)
    }

    fn last_error(&self) -> String {
        lock(&self.last_error).clone()
    }

    fn deal_subscribe(&self, sink: Arc<dyn DealSink>) -> bool {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        if !self.connected.load(Ordering::SeqCst) {
            self.set_error("No connection (6)");
            return false;
        }
        if lock(&self.config).fail_subscribe {
            self.set_error("Subscribe rejected (13)");
            return false;
        }

        self.set_error("");
        *lock(&self.sink) = Some(sink);
        true
    }

    fn deal_request_by_group(&self, _groups: &str, from: i64, to: i64) -> Option<Vec<RawDeal>> {
        let deals = self
            .scripted_deals()
            .into_iter()
            .filter(|deal| deal.time >= from && deal.time <= to)
            .collect();
        self.guard_query(deals)
    }

    fn deal_request_by_group_symbol(
        &self,
        _groups: &str,
        symbol: &str,
        from: i64,
        to: i64,
    ) -> Option<Vec<RawDeal>> {
        let deals = self
            .scripted_deals()
            .into_iter()
            .filter(|deal| deal.symbol == symbol && deal.time >= from && deal.time <= to)
            .collect();
        self.guard_query(deals)
    }

    fn deal_request_by_logins(&self, logins: &[u64], from: i64, to: i64) -> Option<Vec<RawDeal>> {
        let deals = self
            .scripted_deals()
            .into_iter()
            .filter(|deal| logins.contains(&deal.login) && deal.time >= from && deal.time <= to)
            .collect();
        self.guard_query(deals)
    }

    fn deal_request_by_logins_symbol(
        &self,
        logins: &[u64],
        symbol: &str,
        from: i64,
        to: i64,
    ) -> Option<Vec<RawDeal>> {
        let deals = self
            .scripted_deals()
            .into_iter()
            .filter(|deal| {
                logins.contains(&deal.login)
                    && deal.symbol == symbol
                    && deal.time >= from
                    && deal.time <= to
            })
            .collect();
        self.guard_query(deals)
    }

    fn deal_request_by_tickets(&self, tickets: &[u64]) -> Option<Vec<RawDeal>> {
        let deals = self
            .scripted_deals()
            .into_iter()
            .filter(|deal| tickets.contains(&deal.ticket))
            .collect();
        self.guard_query(deals)
    }

    fn deal_request_page(
        &self,
        login: u64,
        from: i64,
        to: i64,
        offset: u32,
        total: u32,
    ) -> Option<Vec<RawDeal>> {
        let deals = self
            .scripted_deals()
            .into_iter()
            .filter(|deal| deal.login == login && deal.time >= from && deal.time <= to)
            .skip(offset as usize)
            .take(total as usize)
            .collect();
        self.guard_query(deals)
    }

    fn position_request(&self) -> Option<Vec<RawPosition>> {
        let positions = lock(&self.positions).clone();
        self.guard_query(positions)
    }

    fn group_request_array(&self) -> Option<Vec<RawGroup>> {
        let groups = lock(&self.groups).clone();
        self.guard_query(groups)
    }

    fn symbol_request_array(&self) -> Option<Vec<RawSymbolInfo>> {
        let symbols = lock(&self.symbols).clone();
        self.guard_query(symbols)
    }

    fn user_request_by_group(&self, mask: &str) -> Option<Vec<RawUser>> {
        let users = lock(&self.users)
            .clone()
            .into_iter()
            .filter(|user| mask == "*" || user.group == mask)
            .collect();
        self.guard_query(users)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
