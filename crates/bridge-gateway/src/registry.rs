//! 세션 레지스트리.

use crate::error::GatewayError;
use crate::session::{Session, SessionSummary};
use crate::traits::{ManagerApi, ManagerCredentials};
use bridge_core::{BridgeError, BridgeResult, GatewayConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 세션별 SDK 인스턴스를 만드는 팩토리.
///
/// 운영 환경에서는 실제 SDK 바인딩이, 테스트와 개발 서버에서는
/// `SimulatedManagerApi` 가 이 자리에 꽂힙니다.
pub trait ManagerApiFactory: Send + Sync {
    /// 새 SDK 인스턴스를 생성합니다.
    fn create(&self, credentials: &ManagerCredentials) -> Arc<dyn ManagerApi>;
}

impl<F> ManagerApiFactory for F
where
    F: Fn(&ManagerCredentials) -> Arc<dyn ManagerApi> + Send + Sync,
{
    fn create(&self, credentials: &ManagerCredentials) -> Arc<dyn ManagerApi> {
        self(credentials)
    }
}

/// 식별자별 세션의 단일 소유자.
///
/// 프로세스 시작 시 하나 생성되어 핸들로 전달됩니다. 전역 상태가
/// 아니며, 맵은 하나의 뮤텍스 도메인입니다 (await 지점을 넘어
/// 락을 잡지 않습니다).
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    factory: Arc<dyn ManagerApiFactory>,
    config: GatewayConfig,
}

impl SessionRegistry {
    /// 새 레지스트리를 생성합니다.
    pub fn new(factory: Arc<dyn ManagerApiFactory>, config: GatewayConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory,
            config,
        }
    }

    /// 식별자의 세션을 반환하고, 없으면 만들어 등록합니다.
    ///
    /// 같은 식별자로 동시에 호출해도 모두 동일한 세션 하나를 받습니다.
    pub fn get_or_create(
        &self,
        identifier: &str,
        credentials: ManagerCredentials,
    ) -> Arc<Session> {
        let mut sessions = lock(&self.sessions);
        if let Some(session) = sessions.get(identifier) {
            return session.clone();
        }

        let api = self.factory.create(&credentials);
        let session = Session::new(identifier, credentials, api, self.config.clone());
        sessions.insert(identifier.to_string(), session.clone());
        tracing::info!(session = identifier, "Session registered");
        session
    }

    /// 식별자의 세션을 반환합니다.
    pub fn get(&self, identifier: &str) -> BridgeResult<Arc<Session>> {
        lock(&self.sessions)
            .get(identifier)
            .cloned()
            .ok_or_else(|| GatewayError::SessionNotFound(identifier.to_string()).into())
    }

    /// 세션을 해제하고 레지스트리에서 제거합니다.
    ///
    /// 살아 있는 연결을 실제로 끊었는지 반환합니다.
    pub async fn remove(&self, identifier: &str) -> BridgeResult<bool> {
        let session = lock(&self.sessions)
            .remove(identifier)
            .ok_or_else(|| BridgeError::from(GatewayError::SessionNotFound(identifier.to_string())))?;

        let was_live = session.disconnect().await;
        tracing::info!(session = identifier, was_live, "Session removed");
        Ok(was_live)
    }

    /// 등록된 세션 요약 목록.
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = lock(&self.sessions)
            .values()
            .map(|session| session.summary())
            .collect();
        summaries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        summaries
    }

    /// 등록된 세션 수.
    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// 세션이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
