//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::StatusCode;
use axum::Json;
use bridge_core::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "SESSION_NOT_FOUND",
///   "message": "세션을 찾을 수 없음: alpha",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "SESSION_NOT_FOUND", "INVALID_INPUT")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// `BridgeError` 를 (상태 코드, 에러 응답) 쌍으로 변환합니다.
///
/// - `NotFound` → 404
/// - `ValidationFailure`, `ConfigMissing` → 400
/// - `ConnectionFailure`, `QueryFailure` → 502 (외부 게이트웨이 탓)
/// - 그 외 → 500
pub fn bridge_error_response(error: BridgeError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code) = match &error {
        BridgeError::NotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
        BridgeError::ValidationFailure(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        BridgeError::ConfigMissing(_) => (StatusCode::BAD_REQUEST, "CONFIG_MISSING"),
        BridgeError::ConnectionFailure(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_CONNECT_FAILED"),
        BridgeError::QueryFailure(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_QUERY_FAILED"),
        BridgeError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR"),
        BridgeError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
        }
        BridgeError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    (status, Json(ApiErrorResponse::new(code, error.to_string())))
}

/// 데이터베이스가 설정되지 않은 배포에서 DB 의존 엔드포인트 호출 시 응답.
pub fn db_not_configured() -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiErrorResponse::new(
            "DB_NOT_CONFIGURED",
            "database is not configured for this deployment",
        )),
    )
}
