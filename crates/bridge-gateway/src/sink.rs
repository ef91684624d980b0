//! 라이브 체결 수집 싱크.

use crate::normalize::normalize_deal;
use crate::traits::{DealSink, RawDeal};
use bridge_core::Deal;
use std::sync::Mutex;

/// 세션별 체결 버퍼.
///
/// SDK 스레드가 추가하고 팬아웃 펌프(또는 일회성 드레인 요청)가
/// 비웁니다. 추가는 버퍼 락 외에 어떤 것도 기다리지 않으며, 드레인은
/// 원자적 take-and-clear 입니다.
#[derive(Debug, Default)]
pub struct DealBuffer {
    deals: Mutex<Vec<Deal>>,
}

impl DealBuffer {
    /// 빈 버퍼를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 체결을 추가합니다.
    pub fn push(&self, deal: Deal) {
        match self.deals.lock() {
            Ok(mut deals) => deals.push(deal),
            // poisoned 락도 계속 사용
            Err(poisoned) => poisoned.into_inner().push(deal),
        }
    }

    /// 버퍼 내용을 모두 꺼내고 비웁니다.
    pub fn drain(&self) -> Vec<Deal> {
        match self.deals.lock() {
            Ok(mut deals) => std::mem::take(&mut *deals),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// 현재 버퍼 크기.
    pub fn len(&self) -> usize {
        match self.deals.lock() {
            Ok(deals) => deals.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// 버퍼가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `DealSink` 구현: add 이벤트를 정규화해 버퍼에 쌓습니다.
///
/// update/delete/sync/perform 은 관측 로그만 남깁니다.
pub struct BufferSink {
    identifier: String,
    buffer: std::sync::Arc<DealBuffer>,
}

impl BufferSink {
    /// 주어진 버퍼에 쓰는 싱크를 생성합니다.
    pub fn new(identifier: impl Into<String>, buffer: std::sync::Arc<DealBuffer>) -> Self {
        Self {
            identifier: identifier.into(),
            buffer,
        }
    }
}

impl DealSink for BufferSink {
    fn on_deal_add(&self, raw: RawDeal) {
        let deal = normalize_deal(raw);
        tracing::debug!(
            session = %self.identifier,
            ticket = deal.ticket,
            login = deal.login,
            "Deal received"
        );
        self.buffer.push(deal);
    }

    fn on_deal_update(&self, raw: RawDeal) {
        tracing::trace!(session = %self.identifier, ticket = raw.ticket, "Deal update ignored");
    }

    fn on_deal_delete(&self, raw: RawDeal) {
        tracing::trace!(session = %self.identifier, ticket = raw.ticket, "Deal delete ignored");
    }

    fn on_deal_sync(&self) {
        tracing::trace!(session = %self.identifier, "Deal sync");
    }

    fn on_deal_perform(&self) {
        tracing::trace!(session = %self.identifier, "Deal batch performed");
    }
}
