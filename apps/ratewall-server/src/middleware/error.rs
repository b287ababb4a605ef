//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use ratewall_core::LimiterError;
use ratewall_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    Conflict(String),
    Unavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Unavailable(msg) => write!(f, "Backend unavailable: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Unavailable(detail) => {
                // Log backend errors
                tracing::error!("Limiter backend error: {}", detail);
                ErrorResponse::service_unavailable("Rate limiter backend unavailable")
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from limiter errors
impl From<LimiterError> for AppError {
    fn from(err: LimiterError) -> Self {
        match err {
            LimiterError::AlreadyExists(list) => AppError::Conflict(format!("{} exists", list)),
            LimiterError::Counter(e) => AppError::Unavailable(e.to_string()),
            LimiterError::Membership(e) => AppError::Unavailable(e.to_string()),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
