use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::error::AppError;
use crate::models::SearchRequest;
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::post().to(search));
}

/// Rank games for the caller or a shared plan
///
/// POST /api/v1/search
///
/// Request body:
/// ```json
/// {
///   "preferences": { "team_text": "Yankees", "date_start": "...", "date_end": "...", ... },
///   "plan_id": "optional plan id"
/// }
/// ```
async fn search(
    state: web::Data<AppState>,
    body: web::Json<SearchRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if let Err(errors) = body.validate() {
        tracing::info!("Validation failed for search request: field_errors={:?}", errors);
        return Err(errors.into());
    }

    let user_id = state.caller(&req);
    let response = state
        .orchestrator
        .search(&body.preferences, body.plan_id.as_deref(), &user_id)
        .await?;

    Ok(HttpResponse::Ok().json(response))
}
