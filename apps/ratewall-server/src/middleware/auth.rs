//! Admin authentication for the limiter routes.
//!
//! The limiter routes can whitelist, reset and blocklist arbitrary ids, so
//! they sit behind a shared bearer token. Without a configured token they
//! refuse every request.

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, http::StatusCode,
    http::header, web,
};
use ratewall_shared::ErrorResponse;
use std::fmt;
use std::future::{Ready, ready};

/// The configured admin token, registered as app data.
#[derive(Clone, Default)]
pub struct AdminToken(Option<String>);

impl AdminToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.is_empty()))
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    fn matches(&self, presented: &str) -> bool {
        match &self.0 {
            Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
            None => false,
        }
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AdminToken")
            .field(&self.0.as_ref().map(|_| "***"))
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug)]
pub enum AdminError {
    /// No token configured on this instance.
    Disabled,
    MissingAuth,
    InvalidToken,
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::Disabled => write!(f, "admin API disabled"),
            AdminError::MissingAuth => write!(f, "missing bearer token"),
            AdminError::InvalidToken => write!(f, "invalid bearer token"),
        }
    }
}

impl ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Disabled | AdminError::InvalidToken => StatusCode::FORBIDDEN,
            AdminError::MissingAuth => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AdminError::Disabled => ErrorResponse::new(403, "Forbidden")
                .with_detail("Set RATE_LIMIT_ADMIN_TOKEN to enable the limiter API."),
            AdminError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Provide the admin token as a Bearer token."),
            AdminError::InvalidToken => ErrorResponse::new(403, "Forbidden"),
        };

        let mut response = HttpResponse::build(self.status_code());
        if matches!(self, AdminError::MissingAuth) {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(error)
    }
}

/// Extractor that only succeeds for requests carrying the admin token.
#[derive(Debug)]
pub struct Admin;

impl FromRequest for Admin {
    type Error = AdminError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

fn authorize(req: &HttpRequest) -> Result<Admin, AdminError> {
    let token = match req.app_data::<web::Data<AdminToken>>() {
        Some(token) if token.is_configured() => token,
        _ => return Err(AdminError::Disabled),
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AdminError::MissingAuth)?
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AdminError::InvalidToken)?;

    if token.matches(presented.trim()) {
        Ok(Admin)
    } else {
        tracing::warn!(path = %req.path(), "Rejected limiter API call with a bad token");
        Err(AdminError::InvalidToken)
    }
}
