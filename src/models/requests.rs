use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::Preferences;

/// Request to run a search, or to save preferences
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(nested)]
    pub preferences: Preferences,
    #[serde(default)]
    pub plan_id: Option<String>,
}

/// Request to create a shared plan
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlanCreateRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

/// Query string of the calendar OAuth callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCallbackQuery {
    #[serde(default = "default_account_email")]
    pub account_email: String,
}

fn default_account_email() -> String {
    "demo@example.com".to_string()
}
