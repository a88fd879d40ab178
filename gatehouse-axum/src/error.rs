use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_core::error::{AuthError, Error};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients.
///
/// Every response body is `{"error": string, "code": string}`. The variants
/// here are already collapsed for the outside world: bad token, revoked
/// session, missing user, and deactivated account all arrive as
/// [`ApiError::Unauthorized`]; the distinct internal reason is logged before
/// this type is constructed, never encoded into it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Account locked, try again in {minutes} minutes")]
    AccountLocked { minutes: i64 },

    #[error("Too many requests, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::AccountLocked { .. } | ApiError::RateLimited { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::AccountLocked { .. } => "ACCOUNT_LOCKED",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::Internal => "INTERNAL",
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(e) => ApiError::Validation(e.to_string()),
            Error::Auth(AuthError::InvalidCredentials) => ApiError::InvalidCredentials,
            Error::Auth(AuthError::AccountLocked { until }) => {
                let minutes = (until - chrono::Utc::now()).num_minutes().max(1);
                ApiError::AccountLocked { minutes }
            }
            // Deactivated and missing accounts are not distinguishable from
            // a bad token on the wire
            Error::Auth(_) | Error::Session(_) => {
                tracing::debug!(error = %err, "Rejecting request as unauthorized");
                ApiError::Unauthorized
            }
            Error::RateLimited { retry_after } => ApiError::RateLimited {
                retry_after_secs: retry_after.as_secs(),
            },
            Error::Storage(_) | Error::Crypto(_) | Error::Config(_) => {
                tracing::error!(error = %err, "Internal error handling request");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
