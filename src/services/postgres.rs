use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::models::{
    AuditEntry, CalendarProviderKind, ConnectedCalendarProvider, Plan, Preferences,
};
use crate::services::store::{new_plan, plan_not_found, Store, StoreError};

/// PostgreSQL-backed store
///
/// Each record is kept as a JSONB document keyed by its natural id, so every
/// mutation is one upsert on one row.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store from optional pool settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn get_preferences(&self, user_id: &str) -> Result<Preferences, StoreError> {
        let defaults = Preferences::default_from(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO preferences (user_id, preferences)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Json(&defaults))
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT preferences FROM preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let Json(preferences): Json<Preferences> = row.try_get("preferences")?;
        Ok(preferences)
    }

    async fn set_preferences(&self, user_id: &str, preferences: &Preferences) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO preferences (user_id, preferences)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET preferences = EXCLUDED.preferences
            "#,
        )
        .bind(user_id)
        .bind(Json(preferences))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user_providers(&self, user_id: &str) -> Result<Vec<ConnectedCalendarProvider>, StoreError> {
        let rows = sqlx::query(
            "SELECT record FROM calendar_providers WHERE user_id = $1 ORDER BY provider",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let Json(record): Json<ConnectedCalendarProvider> = row.try_get("record")?;
                Ok(record)
            })
            .collect()
    }

    async fn set_user_provider(&self, user_id: &str, provider: ConnectedCalendarProvider) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO calendar_providers (user_id, provider, record)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, provider) DO UPDATE SET record = EXCLUDED.record
            "#,
        )
        .bind(user_id)
        .bind(provider.provider.as_str())
        .bind(Json(&provider))
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, provider = provider.provider.as_str(), "Stored calendar connection");
        Ok(())
    }

    async fn disconnect_user_provider(&self, user_id: &str, provider: CalendarProviderKind) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM calendar_providers WHERE user_id = $1 AND provider = $2")
            .bind(user_id)
            .bind(provider.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_plan(&self, owner_user_id: &str, name: &str) -> Result<Plan, StoreError> {
        let plan = new_plan(owner_user_id, name);

        sqlx::query("INSERT INTO plans (plan_id, plan) VALUES ($1, $2)")
            .bind(&plan.id)
            .bind(Json(&plan))
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT INTO plan_preferences (plan_id, preferences) VALUES ($1, $2)")
            .bind(&plan.id)
            .bind(Json(Preferences::default_from(plan.created_at)))
            .execute(&self.pool)
            .await?;

        Ok(plan)
    }

    async fn join_plan(&self, plan_id: &str, user_id: &str) -> Result<Plan, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT plan FROM plans WHERE plan_id = $1 FOR UPDATE")
            .bind(plan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| plan_not_found(plan_id))?;

        let Json(mut plan): Json<Plan> = row.try_get("plan")?;
        if !plan.participant_user_ids.iter().any(|id| id == user_id) {
            plan.participant_user_ids.push(user_id.to_string());
            sqlx::query("UPDATE plans SET plan = $2 WHERE plan_id = $1")
                .bind(plan_id)
                .bind(Json(&plan))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(plan)
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, StoreError> {
        let row = sqlx::query("SELECT plan FROM plans WHERE plan_id = $1")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(plan): Json<Plan> = row.try_get("plan")?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    async fn get_plan_preferences(&self, plan_id: &str) -> Result<Option<Preferences>, StoreError> {
        let row = sqlx::query("SELECT preferences FROM plan_preferences WHERE plan_id = $1")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(preferences): Json<Preferences> = row.try_get("preferences")?;
                Ok(Some(preferences))
            }
            None => Ok(None),
        }
    }

    async fn log(&self, event: &str, payload: serde_json::Value) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO audit_log (event, payload, ts) VALUES ($1, $2, $3)")
            .bind(event)
            .bind(Json(payload))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn audit_entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query("SELECT event, payload, ts FROM audit_log ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let Json(payload): Json<serde_json::Value> = row.try_get("payload")?;
                Ok(AuditEntry {
                    event: row.try_get("event")?,
                    payload,
                    ts: row.try_get("ts")?,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
