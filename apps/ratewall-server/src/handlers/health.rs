//! Liveness probe. Exempt from the request guard.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Limiter name, which is also the broadcast channel.
    pub limiter: String,
    /// `redis`, or `memory` when running standalone.
    pub backend: &'static str,
    pub timestamp: String,
}

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        limiter: state.limiter.channel().to_string(),
        backend: state.backend_kind(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use ratewall_core::LimiterConfig;
    use ratewall_infra::Backends;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;

    #[actix_web::test]
    async fn test_health_reports_backend() {
        let backends = Backends::in_memory();
        let builder = LimiterConfig::builder("login", Duration::from_secs(60)).app_prefix("shop");
        let limiter = Arc::new(backends.build_limiter(builder).await.unwrap());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState { limiter, backends }))
                .route("/api/health", web::get().to(health_check)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["limiter"], "shop-login");
        assert_eq!(body["backend"], "memory");
    }
}
