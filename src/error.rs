/// 서비스 전역 에러
/// 각 에러는 호출자가 구분할 수 있도록 그대로 노출된다.
// region:    --- Imports
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error as ThisError;
use tracing::error;

// endregion: --- Imports

// region:    --- Error Codes
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const SELF_BID: &str = "SELF_BID";
pub const LOW_BID: &str = "LOW_BID";
pub const ALREADY_ENDED: &str = "ALREADY_ENDED";
pub const NOT_OWNER: &str = "NOT_OWNER";
pub const AUCTION_FROZEN: &str = "AUCTION_FROZEN";
pub const INVALID_FIELD: &str = "INVALID_FIELD";
pub const INVALID_CATEGORY: &str = "INVALID_CATEGORY";
pub const INVALID_END_DATE: &str = "INVALID_END_DATE";
pub const EMAIL_IN_USE: &str = "EMAIL_IN_USE";
pub const EMPTY_PATCH: &str = "EMPTY_PATCH";

// Postgres SQLSTATE
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

// endregion: --- Error Codes

// region:    --- Error
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{message}")]
    InvalidInput { code: &'static str, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("데이터베이스 오류: {0}")]
    StoreFailure(sqlx::Error),

    #[error("내부 오류: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code,
            message: message.into(),
        }
    }

    /// 응답 본문에 실리는 머신 코드
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => NOT_FOUND,
            Error::Forbidden { code, .. } => *code,
            Error::Unauthenticated(_) => "UNAUTHENTICATED",
            Error::InvalidInput { code, .. } => *code,
            Error::Conflict(_) => "CONFLICT",
            Error::StoreFailure(_) => "STORE_FAILURE",
            Error::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::StoreFailure(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 호출자 재시도가 허용되는 유일한 종류
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreFailure(_))
    }
}

/// 락 대기 초과, 교착, 직렬화 실패는 경합에서 진 것으로 본다.
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        let sqlstate = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());

        match sqlstate.as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) | Some(LOCK_NOT_AVAILABLE) => {
                Error::Conflict("동시 요청과 충돌했습니다. 다시 시도해 주세요.".to_string())
            }
            _ => Error::StoreFailure(err),
        }
    }
}

/// 본문 파싱 실패도 같은 에러 본문으로 응답한다.
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::invalid(
            INVALID_FIELD,
            format!("요청 본문이 올바르지 않습니다: {}", rejection.body_text()),
        )
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::invalid(
            INVALID_FIELD,
            format!("경로 값이 올바르지 않습니다: {}", rejection.body_text()),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = match &self {
            Error::StoreFailure(e) => {
                error!("{:<12} --> 저장소 오류: {:?}", "Error", e);
                "요청을 처리하는 중 저장소 오류가 발생했습니다.".to_string()
            }
            Error::Internal(e) => {
                error!("{:<12} --> 내부 오류: {}", "Error", e);
                "요청을 처리하는 중 내부 오류가 발생했습니다.".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(serde_json::json!({
                "error": message,
                "code": self.code(),
                "retryable": self.is_retryable(),
            })),
        )
            .into_response()
    }
}

// endregion: --- Error

// endregion: --- Tests
