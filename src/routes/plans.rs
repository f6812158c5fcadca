use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::error::AppError;
use crate::models::{ParticipantReadiness, Plan, PlanCreateRequest, PlanReadinessResponse};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/plans", web::post().to(create_plan))
        .route("/plans/{plan_id}", web::get().to(get_plan))
        .route("/plans/{plan_id}/join", web::post().to(join_plan))
        .route("/plans/{plan_id}/readiness", web::get().to(plan_readiness));
}

async fn load_plan(state: &AppState, plan_id: &str) -> Result<Plan, AppError> {
    state
        .store
        .get_plan(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound("plan not found".to_string()))
}

/// Create a shared plan owned by the caller
///
/// POST /api/v1/plans
///
/// Request body:
/// ```json
/// { "name": "string" }
/// ```
async fn create_plan(
    state: web::Data<AppState>,
    body: web::Json<PlanCreateRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let user_id = state.caller(&req);

    let plan = state.store.create_plan(&user_id, &body.name).await?;
    state
        .store
        .log("plan_created", serde_json::json!({ "plan_id": plan.id, "owner": user_id }))
        .await?;

    tracing::info!(plan_id = %plan.id, owner = %user_id, "Plan created");
    Ok(HttpResponse::Ok().json(state.plan_response(plan).await?))
}

/// POST /api/v1/plans/{plan_id}/join
async fn join_plan(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user_id = state.caller(&req);

    let plan = state.store.join_plan(&path, &user_id).await?;
    state
        .store
        .log("plan_joined", serde_json::json!({ "plan_id": plan.id, "user_id": user_id }))
        .await?;

    tracing::info!(plan_id = %plan.id, user_id = %user_id, "Plan joined");
    Ok(HttpResponse::Ok().json(state.plan_response(plan).await?))
}

async fn get_plan(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let plan = load_plan(&state, &path).await?;
    Ok(HttpResponse::Ok().json(state.plan_response(plan).await?))
}

/// Whether every participant has a connected calendar
async fn plan_readiness(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let plan = load_plan(&state, &path).await?;

    let mut participants = Vec::with_capacity(plan.participant_user_ids.len());
    for user_id in &plan.participant_user_ids {
        let connected_accounts = state.store.get_user_providers(user_id).await?.len();
        participants.push(ParticipantReadiness {
            user_id: user_id.clone(),
            connected_accounts,
            ready: connected_accounts > 0,
        });
    }

    Ok(HttpResponse::Ok().json(PlanReadinessResponse {
        plan_id: plan.id,
        all_ready: participants.iter().all(|p| p.ready),
        participants,
    }))
}
