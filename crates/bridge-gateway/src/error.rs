//! 게이트웨이 에러 타입.

use bridge_core::BridgeError;
use thiserror::Error;

/// 게이트웨이 관련 에러.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 핸드셰이크 실패 (SDK 에러 문자열 포함)
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// 핸드셰이크 타임아웃
    #[error("Connect timed out after {0}ms")]
    ConnectTimeout(u64),

    /// 조회가 에러 센티널을 반환함
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// 라이브 스트림 구독 실패
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// 외부 호출 이전에 거부된 입력
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 알 수 없는 세션 식별자
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// 핸드셰이크 워커가 결과 없이 종료됨
    #[error("Handshake worker dropped")]
    WorkerDropped,
}

/// 게이트웨이 작업을 위한 Result 타입.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<GatewayError> for BridgeError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ConnectFailed(msg) => BridgeError::ConnectionFailure(msg),
            GatewayError::ConnectTimeout(ms) => {
                BridgeError::ConnectionFailure(format!("handshake timed out after {}ms", ms))
            }
            GatewayError::WorkerDropped => {
                BridgeError::ConnectionFailure("handshake worker dropped".to_string())
            }
            GatewayError::QueryFailed(msg) => BridgeError::QueryFailure(msg),
            GatewayError::SubscribeFailed(msg) => BridgeError::QueryFailure(msg),
            GatewayError::InvalidInput(msg) => BridgeError::ValidationFailure(msg),
            GatewayError::SessionNotFound(id) => BridgeError::NotFound(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_connection_failure() {
        let err: BridgeError = GatewayError::ConnectTimeout(120_000).into();
        assert!(err.is_gateway_error());
        assert!(err.to_string().contains("120000ms"));
    }

    #[test]
    fn test_invalid_input_maps_to_client_error() {
        let err: BridgeError = GatewayError::InvalidInput("empty logins".to_string()).into();
        assert!(err.is_client_error());
    }
}
