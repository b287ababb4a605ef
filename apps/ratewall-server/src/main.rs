//! # Ratewall Server
//!
//! Actix-web host for a shared-state rate limiter: decision and list
//! administration endpoints, plus an optional guard on every API request.

use actix_web::middleware::Condition;
use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::auth::AdminToken;
use middleware::rate_limit::RateLimitMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env()?;

    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        "Starting Ratewall server on {}:{}",
        config.host,
        config.port
    );

    // Build application state
    let state = AppState::new(&config).await?;
    let guard = config.limiter.guard_requests;
    let admin_token = AdminToken::new(config.admin_token.clone());
    if !admin_token.is_configured() {
        tracing::warn!("RATE_LIMIT_ADMIN_TOKEN not set, limiter API disabled");
    }

    tracing::info!(
        limiter = %state.limiter.channel(),
        backend = state.backend_kind(),
        guard,
        "Limiter ready"
    );

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(
                guard,
                RateLimitMiddleware::new(state.limiter.clone()),
            ))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(admin_token.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
