//! Limiter decision and list administration handlers.
//!
//! Every route requires the admin bearer token. List mutations made here
//! are broadcast to the other instances.

use actix_web::{HttpResponse, web};

use ratewall_core::{ListKind, Verdict};
use ratewall_shared::ApiResponse;
use ratewall_shared::dto::{CheckResponse, ListQuery, ListResponse};

use crate::middleware::auth::Admin;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn list_name(kind: ListKind) -> &'static str {
    match kind {
        ListKind::White => "whitelist",
        ListKind::Block => "blocklist",
    }
}

/// POST /api/limiter/check/{id}
pub async fn check(
    _admin: Admin,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    let decision = state.limiter.check(&id).await?;

    let message = match &decision.verdict {
        Verdict::Allow => None,
        Verdict::Warn(note) => Some(note.clone()),
        Verdict::Block(rejection) => Some(rejection.message.clone()),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CheckResponse {
        id,
        attempts: decision.attempts,
        allowed: decision.is_allowed(),
        message,
    })))
}

/// DELETE /api/limiter/check/{id}
pub async fn reset(
    _admin: Admin,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.limiter.check_reset(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/limiter/{list}?id=
pub async fn list(
    _admin: Admin,
    state: web::Data<AppState>,
    kind: web::Path<ListKind>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let kind = kind.into_inner();
    let ids = state.limiter.list(kind, query.id.as_deref()).await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ListResponse {
        list: list_name(kind).to_string(),
        ids,
    })))
}

/// POST /api/limiter/{list}/{id}
pub async fn add(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<(ListKind, String)>,
) -> AppResult<HttpResponse> {
    let (kind, id) = path.into_inner();
    state.limiter.add(kind, &id, true).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        id,
        format!("added to {}", list_name(kind)),
    )))
}

/// DELETE /api/limiter/{list}/{id}
pub async fn remove(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<(ListKind, String)>,
) -> AppResult<HttpResponse> {
    let (kind, id) = path.into_inner();
    state.limiter.remove(kind, &id, true).await?;
    Ok(HttpResponse::NoContent().finish())
}
