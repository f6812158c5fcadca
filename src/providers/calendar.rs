use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::models::BusyInterval;
use crate::providers::{CalendarProvider, ProviderError};

#[derive(Debug, Default, Deserialize)]
struct FreeBusyFixture {
    #[serde(default)]
    accounts: HashMap<String, Vec<BusyInterval>>,
}

/// Calendar provider serving free/busy data from a fixture document
///
/// Fixture shape: `{ "accounts": { "<email>": [ { "start": .., "end": .. } ] } }`
#[derive(Debug, Default)]
pub struct FixtureCalendarProvider {
    accounts: HashMap<String, Vec<BusyInterval>>,
}

impl FixtureCalendarProvider {
    pub fn new(accounts: HashMap<String, Vec<BusyInterval>>) -> Self {
        Self { accounts }
    }

    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let fixture: FreeBusyFixture = serde_json::from_str(json)
            .map_err(|e| ProviderError::Fixture(format!("Failed to parse free/busy fixture: {}", e)))?;
        Ok(Self::new(fixture.accounts))
    }

    /// Load a fixture file; a missing file means every account is free
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("Free/busy fixture {} not found, calendars will be empty", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Fixture(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[async_trait]
impl CalendarProvider for FixtureCalendarProvider {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn get_free_busy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        accounts: &[String],
    ) -> Result<Vec<BusyInterval>, ProviderError> {
        let intervals = accounts
            .iter()
            .filter_map(|account| self.accounts.get(account))
            .flatten()
            .filter(|busy| busy.start < time_max && busy.end > time_min)
            .map(|busy| BusyInterval {
                start: busy.start.max(time_min),
                end: busy.end.min(time_max),
            })
            .collect();

        Ok(intervals)
    }
}
