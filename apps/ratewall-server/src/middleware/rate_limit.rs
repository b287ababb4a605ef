//! Rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::StatusCode,
    http::header::{HeaderName, HeaderValue},
};
use ratewall_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use ratewall_core::{RateLimiter, Rejection, Verdict};

/// Paths that are never counted.
const EXEMPT_PATHS: &[&str] = &["/api/health"];

/// Rate limiting middleware factory.
///
/// Every request is checked against the limiter using the client IP as id.
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
}

fn rejected(rejection: &Rejection, path: &str) -> HttpResponse {
    let status = StatusCode::from_u16(rejection.status).unwrap_or(StatusCode::FORBIDDEN);
    let error = ErrorResponse::new(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Blocked"),
    )
    .with_detail(rejection.message.clone())
    .with_instance(path);

    let mut response = HttpResponse::build(status);
    response.insert_header(("X-RateLimit-Remaining", "0"));
    response.json(error)
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        if EXEMPT_PATHS.contains(&req.path()) {
            return Box::pin(async move {
                let res = service.call(req).await?;
                Ok(res.map_into_left_body())
            });
        }

        // Get client identifier (IP address)
        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        Box::pin(async move {
            let decision = match limiter.check(&key).await {
                Ok(decision) => Some(decision),
                Err(e) => {
                    // Storage errors fail open
                    tracing::error!(key = %key, error = %e, "Rate limiter error, failing open");
                    None
                }
            };

            if let Some(rejection) = decision.as_ref().and_then(|d| d.rejection()) {
                tracing::warn!(key = %key, status = rejection.status, "Request blocked by rate limiter");

                let response = rejected(rejection, req.path());
                let (http_req, _payload) = req.into_parts();
                let srv_response = ServiceResponse::new(http_req, response);
                return Ok(srv_response.map_into_right_body());
            }

            let mut res = service.call(req).await?;

            if let Some(decision) = decision {
                if let Ok(value) = HeaderValue::from_str(&decision.attempts.to_string()) {
                    res.headers_mut()
                        .insert(HeaderName::from_static("x-ratelimit-attempts"), value);
                }
                if let Verdict::Warn(note) = &decision.verdict {
                    if let Ok(value) = HeaderValue::from_str(note) {
                        res.headers_mut()
                            .insert(HeaderName::from_static("x-ratelimit-warning"), value);
                    }
                }
            }

            Ok(res.map_into_left_body())
        })
    }
}
