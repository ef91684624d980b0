//! 브리지 시스템의 에러 타입.
//!
//! 모든 에러는 단발성입니다. 어떤 컴포넌트도 내부에서 재시도하지 않으며,
//! 재시도/백오프 정책은 호출자의 몫입니다.

use thiserror::Error;

/// 핵심 브리지 에러.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 알 수 없는 세션 식별자
    #[error("세션을 찾을 수 없음: {0}")]
    NotFound(String),

    /// 게이트웨이 핸드셰이크 또는 재연결 실패 (외부 에러 문자열 포함)
    #[error("게이트웨이 연결 실패: {0}")]
    ConnectionFailure(String),

    /// 외부 조회가 에러 센티널을 반환함 (빈 결과와 구분됨)
    #[error("게이트웨이 조회 실패: {0}")]
    QueryFailure(String),

    /// 외부 호출 이전에 거부된 잘못된 필터 입력
    #[error("잘못된 입력: {0}")]
    ValidationFailure(String),

    /// PnL 계산에 필요한 그룹/심볼 설정 또는 환율 누락
    #[error("설정 누락: {0}")]
    ConfigMissing(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 브리지 작업을 위한 Result 타입.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// 클라이언트 입력에서 비롯된 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BridgeError::NotFound(_)
                | BridgeError::ValidationFailure(_)
                | BridgeError::ConfigMissing(_)
        )
    }

    /// 외부 게이트웨이에서 비롯된 에러인지 확인합니다.
    pub fn is_gateway_error(&self) -> bool {
        matches!(
            self,
            BridgeError::ConnectionFailure(_) | BridgeError::QueryFailure(_)
        )
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let not_found = BridgeError::NotFound("demo".to_string());
        assert!(not_found.is_client_error());
        assert!(!not_found.is_gateway_error());

        let validation = BridgeError::ValidationFailure("bad logins".to_string());
        assert!(validation.is_client_error());
    }

    #[test]
    fn test_gateway_error_classification() {
        let conn = BridgeError::ConnectionFailure("timeout".to_string());
        assert!(conn.is_gateway_error());
        assert!(!conn.is_client_error());

        let query = BridgeError::QueryFailure("invalid group mask".to_string());
        assert!(query.is_gateway_error());
    }
}
