use actix_web::{web, HttpResponse, Responder};

use crate::models::{HealthResponse, ReadyChecks, ReadyResponse};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(ready));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await;

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Deployment readiness: calendar connections need the token key
async fn ready(state: web::Data<AppState>) -> impl Responder {
    let checks = ReadyChecks {
        token_key_configured: state.cipher.is_some(),
        ticket_provider: state.orchestrator.ticket_provider().to_string(),
    };

    HttpResponse::Ok().json(ReadyResponse {
        ok: checks.token_key_configured,
        checks,
    })
}
