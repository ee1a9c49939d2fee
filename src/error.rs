use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Request-level failure taxonomy. Every handler surfaces one of these;
/// the HTTP mapping lives in `ResponseError` below.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Malformed or missing input (bad dates, short password, no balance).
    #[display(fmt = "{}", _0)]
    Validation(String),
    /// No valid session/token.
    #[display(fmt = "{}", _0)]
    Authentication(String),
    /// Role or department mismatch.
    #[display(fmt = "{}", _0)]
    Authorization(String),
    /// A referenced entity (user, department, leave type) does not exist.
    #[display(fmt = "{}", _0)]
    Reference(String),
    /// Uniqueness or structural constraint violated.
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    /// Underlying store failure; fatal to the request, not the process.
    #[display(fmt = "{}", _0)]
    Storage(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        ApiError::Authentication(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        ApiError::Authorization(msg.into())
    }

    pub fn reference(msg: impl Into<String>) -> Self {
        ApiError::Reference(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Reference(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "database error");
        ApiError::Storage("db".to_string())
    }
}
