use serde::{Deserialize, Serialize};
use crate::models::domain::{ConnectedAccount, Plan, ScoringWeights, SearchResult};

/// Response for the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub top_three: Vec<SearchResult>,
    pub ranked: Vec<SearchResult>,
    pub scoring_weights: ScoringWeights,
}

/// Participant entry of a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanParticipant {
    pub user_id: String,
    pub connected_accounts: usize,
}

/// Plan with its participants and share link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: Plan,
    pub participants: Vec<PlanParticipant>,
    pub share_url: String,
}

/// Readiness of one participant for a group search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantReadiness {
    pub user_id: String,
    pub connected_accounts: usize,
    pub ready: bool,
}

/// Readiness of a whole plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReadinessResponse {
    pub plan_id: String,
    pub all_ready: bool,
    pub participants: Vec<ParticipantReadiness>,
}

/// Current caller and their connected calendars
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub connected_accounts: Vec<ConnectedAccount>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Readiness checks of the deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyChecks {
    pub token_key_configured: bool,
    pub ticket_provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ok: bool,
    pub checks: ReadyChecks,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
