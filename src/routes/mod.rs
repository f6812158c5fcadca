// Route exports
pub mod accounts;
pub mod health;
pub mod plans;
pub mod search;

use actix_web::{error, web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::core::SearchOrchestrator;
use crate::error::AppError;
use crate::models::{ErrorResponse, Plan, PlanParticipant, PlanResponse};
use crate::services::{Store, TokenCipher};

/// Header carrying the caller identity
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub orchestrator: Arc<SearchOrchestrator>,
    /// Absent when no token key is configured
    pub cipher: Option<Arc<TokenCipher>>,
    /// Identity of callers that send no `X-User-Id`
    pub default_user_id: String,
}

impl AppState {
    /// Caller identity from the request, or the configured default
    pub fn caller(&self, req: &HttpRequest) -> String {
        req.headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_user_id.clone())
    }

    /// Plan with its participants' connection counts
    pub(crate) async fn plan_response(&self, plan: Plan) -> Result<PlanResponse, AppError> {
        let mut participants = Vec::with_capacity(plan.participant_user_ids.len());
        for user_id in &plan.participant_user_ids {
            participants.push(PlanParticipant {
                user_id: user_id.clone(),
                connected_accounts: self.store.get_user_providers(user_id).await?.len(),
            });
        }

        Ok(PlanResponse {
            share_url: format!("/plan?joinPlan={}", plan.id),
            plan,
            participants,
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(accounts::configure)
            .configure(plans::configure)
            .configure(search::configure),
    );
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let body = ErrorResponse {
        error: "bad_request".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    };
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    let body = ErrorResponse {
        error: "bad_request".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    };
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}
