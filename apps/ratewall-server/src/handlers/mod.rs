//! HTTP handlers and route configuration.

mod health;
mod limiter;

use actix_web::{HttpResponse, error, web};
use ratewall_shared::ErrorResponse;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                let detail = err.to_string();
                error::InternalError::from_response(
                    err,
                    HttpResponse::NotFound().json(ErrorResponse::not_found(detail)),
                )
                .into()
            }))
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Limiter routes
            .service(
                web::scope("/limiter")
                    .route("/check/{id}", web::post().to(limiter::check))
                    .route("/check/{id}", web::delete().to(limiter::reset))
                    .route("/{list}", web::get().to(limiter::list))
                    .route("/{list}/{id}", web::post().to(limiter::add))
                    .route("/{list}/{id}", web::delete().to(limiter::remove)),
            ),
    );
}
