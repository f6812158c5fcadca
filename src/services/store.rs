use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{
    AuditEntry, CalendarProviderKind, ConnectedCalendarProvider, Plan, Preferences,
};

/// Errors that can occur in the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),
}

/// Persistence of preferences, calendar connections, plans and the audit log
///
/// Every mutation is a single-record upsert.
#[async_trait]
pub trait Store: Send + Sync {
    /// Stored preferences, creating defaults on first access
    async fn get_preferences(&self, user_id: &str) -> Result<Preferences, StoreError>;

    async fn set_preferences(&self, user_id: &str, preferences: &Preferences) -> Result<(), StoreError>;

    /// Connected calendars of a user ordered by provider
    async fn get_user_providers(&self, user_id: &str) -> Result<Vec<ConnectedCalendarProvider>, StoreError>;

    async fn set_user_provider(&self, user_id: &str, provider: ConnectedCalendarProvider) -> Result<(), StoreError>;

    async fn disconnect_user_provider(&self, user_id: &str, provider: CalendarProviderKind) -> Result<(), StoreError>;

    /// Create a plan with the owner as first participant
    async fn create_plan(&self, owner_user_id: &str, name: &str) -> Result<Plan, StoreError>;

    /// Add a participant; joining twice is a no-op
    async fn join_plan(&self, plan_id: &str, user_id: &str) -> Result<Plan, StoreError>;

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, StoreError>;

    async fn get_plan_preferences(&self, plan_id: &str) -> Result<Option<Preferences>, StoreError>;

    /// Append an audit entry
    async fn log(&self, event: &str, payload: serde_json::Value) -> Result<(), StoreError>;

    /// Audit entries, oldest first
    async fn audit_entries(&self) -> Result<Vec<AuditEntry>, StoreError>;

    async fn health_check(&self) -> bool;
}

/// Build a fresh plan owned by `owner_user_id`
pub(crate) fn new_plan(owner_user_id: &str, name: &str) -> Plan {
    Plan {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        owner_user_id: owner_user_id.to_string(),
        created_at: Utc::now(),
        participant_user_ids: vec![owner_user_id.to_string()],
    }
}

pub(crate) fn plan_not_found(plan_id: &str) -> StoreError {
    StoreError::NotFound(format!("plan {} not found", plan_id))
}

#[derive(Default)]
struct MemoryState {
    preferences: HashMap<String, Preferences>,
    providers: HashMap<String, Vec<ConnectedCalendarProvider>>,
    plans: HashMap<String, Plan>,
    plan_preferences: HashMap<String, Preferences>,
    audit: Vec<AuditEntry>,
}

/// Process-local store
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_preferences(&self, user_id: &str) -> Result<Preferences, StoreError> {
        let mut state = self.state.write().await;
        let preferences = state
            .preferences
            .entry(user_id.to_string())
            .or_insert_with(|| Preferences::default_from(Utc::now()));
        Ok(preferences.clone())
    }

    async fn set_preferences(&self, user_id: &str, preferences: &Preferences) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.preferences.insert(user_id.to_string(), preferences.clone());
        Ok(())
    }

    async fn get_user_providers(&self, user_id: &str) -> Result<Vec<ConnectedCalendarProvider>, StoreError> {
        let state = self.state.read().await;
        let mut providers = state.providers.get(user_id).cloned().unwrap_or_default();
        providers.sort_by_key(|p| p.provider.as_str());
        Ok(providers)
    }

    async fn set_user_provider(&self, user_id: &str, provider: ConnectedCalendarProvider) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let providers = state.providers.entry(user_id.to_string()).or_default();
        match providers.iter_mut().find(|p| p.provider == provider.provider) {
            Some(existing) => *existing = provider,
            None => providers.push(provider),
        }
        Ok(())
    }

    async fn disconnect_user_provider(&self, user_id: &str, provider: CalendarProviderKind) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(providers) = state.providers.get_mut(user_id) {
            providers.retain(|p| p.provider != provider);
        }
        Ok(())
    }

    async fn create_plan(&self, owner_user_id: &str, name: &str) -> Result<Plan, StoreError> {
        let plan = new_plan(owner_user_id, name);
        let mut state = self.state.write().await;
        state.plans.insert(plan.id.clone(), plan.clone());
        state
            .plan_preferences
            .insert(plan.id.clone(), Preferences::default_from(plan.created_at));
        Ok(plan)
    }

    async fn join_plan(&self, plan_id: &str, user_id: &str) -> Result<Plan, StoreError> {
        let mut state = self.state.write().await;
        let plan = state
            .plans
            .get_mut(plan_id)
            .ok_or_else(|| plan_not_found(plan_id))?;
        if !plan.participant_user_ids.iter().any(|id| id == user_id) {
            plan.participant_user_ids.push(user_id.to_string());
        }
        Ok(plan.clone())
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, StoreError> {
        Ok(self.state.read().await.plans.get(plan_id).cloned())
    }

    async fn get_plan_preferences(&self, plan_id: &str) -> Result<Option<Preferences>, StoreError> {
        Ok(self.state.read().await.plan_preferences.get(plan_id).cloned())
    }

    async fn log(&self, event: &str, payload: serde_json::Value) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.audit.push(AuditEntry {
            event: event.to_string(),
            payload,
            ts: Utc::now(),
        });
        Ok(())
    }

    async fn audit_entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.state.read().await.audit.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
