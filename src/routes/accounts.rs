use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    AuthCallbackQuery, CalendarProviderKind, ConnectedAccount, ConnectedCalendarProvider, MeResponse,
    SearchRequest,
};
use crate::routes::AppState;
use crate::services::CipherError;

/// Scope requested from calendar providers
const FREEBUSY_SCOPE: &str = "freebusy.read";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/auth/{provider}/start", web::post().to(auth_start))
        .route("/auth/{provider}/callback", web::post().to(auth_callback))
        .route("/disconnect/{provider}", web::post().to(disconnect))
        .route("/me", web::get().to(me))
        .route("/preferences", web::get().to(get_preferences))
        .route("/preferences", web::put().to(put_preferences));
}

fn parse_provider(provider: &str) -> Result<CalendarProviderKind, AppError> {
    CalendarProviderKind::parse(provider).ok_or_else(|| AppError::NotFound("unknown provider".to_string()))
}

/// Start the calendar OAuth flow
///
/// POST /api/v1/auth/{provider}/start
async fn auth_start(path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let provider = parse_provider(&path)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "auth_url": format!("/auth/{}/callback?code=mock-code", provider.as_str()),
    })))
}

/// Complete the calendar OAuth flow and store the encrypted token
///
/// POST /api/v1/auth/{provider}/callback?account_email=...
async fn auth_callback(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<AuthCallbackQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let provider = parse_provider(&path)?;
    let user_id = state.caller(&req);
    let cipher = state.cipher.as_ref().ok_or(CipherError::MissingKey)?;

    let token = cipher.encrypt(&format!("{}-refresh-token", provider.as_str()))?;
    let connection = ConnectedCalendarProvider {
        provider,
        account_email: query.account_email.clone(),
        token_encrypted: token,
        scopes: vec![FREEBUSY_SCOPE.to_string()],
        created_at: Utc::now(),
    };
    state.store.set_user_provider(&user_id, connection).await?;
    state
        .store
        .log(
            "provider_connected",
            serde_json::json!({
                "provider": provider.as_str(),
                "email": query.account_email,
                "user_id": user_id,
            }),
        )
        .await?;

    tracing::info!(user_id = %user_id, provider = provider.as_str(), "Calendar connected");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "connected",
        "provider": provider.as_str(),
        "user_id": user_id,
        "account_email": query.account_email,
    })))
}

/// POST /api/v1/disconnect/{provider}
async fn disconnect(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let provider = parse_provider(&path)?;
    let user_id = state.caller(&req);

    state.store.disconnect_user_provider(&user_id, provider).await?;
    state
        .store
        .log(
            "provider_disconnected",
            serde_json::json!({ "provider": provider.as_str(), "user_id": user_id }),
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "disconnected",
        "provider": provider.as_str(),
    })))
}

/// Caller and their connected calendars, without tokens
async fn me(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user_id = state.caller(&req);
    let connected_accounts = state
        .store
        .get_user_providers(&user_id)
        .await?
        .iter()
        .map(ConnectedAccount::from)
        .collect();

    Ok(HttpResponse::Ok().json(MeResponse {
        user_id,
        connected_accounts,
    }))
}

async fn get_preferences(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user_id = state.caller(&req);
    let preferences = state.store.get_preferences(&user_id).await?;
    Ok(HttpResponse::Ok().json(preferences))
}

/// Save the caller's preferences
///
/// PUT /api/v1/preferences with body `{"preferences": {...}}`
async fn put_preferences(
    state: web::Data<AppState>,
    body: web::Json<SearchRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let user_id = state.caller(&req);

    let SearchRequest { preferences, .. } = body.into_inner();
    state.store.set_preferences(&user_id, &preferences).await?;

    tracing::debug!(user_id = %user_id, "Preferences saved");
    Ok(HttpResponse::Ok().json(preferences))
}
