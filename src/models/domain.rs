use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Time-of-day bucket an event starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Bucket an hour of the day: before noon is morning, before 17:00 afternoon
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeOfDay::Morning
        } else if hour < 17 {
            TimeOfDay::Afternoon
        } else {
            TimeOfDay::Evening
        }
    }
}

/// Search preferences supplied by the caller
///
/// The team is resolved from `team_text`, then `team_id`, then the configured
/// default (see [`Preferences::team_query`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_date_window"))]
pub struct Preferences {
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub team_text: Option<String>,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    #[serde(default = "default_party_size")]
    #[validate(range(min = 1, max = 20))]
    pub party_size: u32,
    #[serde(default = "default_budget_total")]
    #[validate(range(min = 0.0))]
    pub budget_total: f64,
    #[serde(default = "default_price_tier")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub price_tier: f64,
    #[serde(default)]
    pub giveaway_only: bool,
    #[serde(default)]
    pub giveaway_keywords: Vec<String>,
    /// Weekdays numbered from Monday = 0
    #[serde(default)]
    pub dow_prefs: Vec<u32>,
    #[serde(default)]
    pub tod_prefs: Vec<TimeOfDay>,
    #[serde(default = "default_zip_code")]
    pub zip_code: String,
    #[serde(default = "default_max_miles")]
    #[validate(range(min = 0.0))]
    pub max_miles: f64,
    #[serde(default = "default_buffer_before")]
    #[validate(range(min = 0, max = 10080))]
    pub buffer_before_mins: i64,
    #[serde(default = "default_buffer_after")]
    #[validate(range(min = 0, max = 10080))]
    pub buffer_after_mins: i64,
    /// Accepted and persisted, not consulted by filtering or scoring.
    #[serde(default)]
    pub exclude_back_to_back_late_nights: bool,
}

fn default_party_size() -> u32 { 2 }
fn default_budget_total() -> f64 { 250.0 }
fn default_price_tier() -> f64 { 0.4 }
fn default_zip_code() -> String { "10001".to_string() }
fn default_max_miles() -> f64 { 50.0 }
fn default_buffer_before() -> i64 { 60 }
fn default_buffer_after() -> i64 { 90 }

fn validate_date_window(preferences: &Preferences) -> Result<(), ValidationError> {
    if preferences.date_end < preferences.date_start {
        let mut err = ValidationError::new("date_window");
        err.message = Some("date_end must not be before date_start".into());
        return Err(err);
    }
    Ok(())
}

impl Preferences {
    /// Preferences with every field at its default, searching the given window
    pub fn with_window(date_start: DateTime<Utc>, date_end: DateTime<Utc>) -> Self {
        Self {
            team_id: None,
            team_text: None,
            date_start,
            date_end,
            party_size: default_party_size(),
            budget_total: default_budget_total(),
            price_tier: default_price_tier(),
            giveaway_only: false,
            giveaway_keywords: vec![],
            dow_prefs: vec![],
            tod_prefs: vec![],
            zip_code: default_zip_code(),
            max_miles: default_max_miles(),
            buffer_before_mins: default_buffer_before(),
            buffer_after_mins: default_buffer_after(),
            exclude_back_to_back_late_nights: false,
        }
    }

    /// Defaults stored for a user or plan that has never saved preferences
    pub fn default_from(now: DateTime<Utc>) -> Self {
        Self::with_window(now, now + Duration::days(90))
    }

    /// Team to search for: free text wins over the id, blank values are ignored
    pub fn team_query<'a>(&'a self, fallback: &'a str) -> &'a str {
        [self.team_text.as_deref(), self.team_id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|team| !team.is_empty())
            .unwrap_or(fallback)
    }

    /// Ticket price band `[low, high]` derived from the budget and price tier
    pub fn price_band(&self) -> PriceBand {
        PriceBand {
            low: (self.budget_total * self.price_tier * 0.25).max(0.0),
            high: self.budget_total * (0.8 + self.price_tier),
        }
    }
}

/// Estimated-cost range used to filter ticket quotes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub low: f64,
    pub high: f64,
}

impl PriceBand {
    #[inline]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

/// A scheduled sporting event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub league: String,
    pub team: String,
    pub opponent: String,
    pub start_time_utc: DateTime<Utc>,
    pub end_time_utc: DateTime<Utc>,
    pub venue: String,
    pub venue_zip: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub giveaway_text: Option<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
}

impl Event {
    /// Giveaway description, treating blank text as no giveaway
    pub fn giveaway(&self) -> Option<&str> {
        self.giveaway_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// Ticket market snapshot for one event and price band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub event_id: String,
    pub min_price: f64,
    pub median_price: f64,
    pub availability_count: u32,
    pub estimated_total: f64,
    pub best_value_score: f64,
    pub deep_link: String,
}

/// Window during which a calendar account is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub event: Event,
    pub ticket_summary: Option<TicketSummary>,
    pub score: f64,
    pub why_recommended: Vec<String>,
}

/// Weights of the five scoring factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub price_value: f64,
    pub giveaway: f64,
    pub day_time: f64,
    pub travel: f64,
    pub availability: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.price_value + self.giveaway + self.day_time + self.travel + self.availability
    }

    /// Weights must each be non-negative and sum to 1.0
    pub fn is_normalized(&self) -> bool {
        let parts = [self.price_value, self.giveaway, self.day_time, self.travel, self.availability];
        parts.iter().all(|w| *w >= 0.0) && (self.total() - 1.0).abs() < 1e-9
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price_value: 0.35,
            giveaway: 0.20,
            day_time: 0.20,
            travel: 0.15,
            availability: 0.10,
        }
    }
}

/// Calendar services a user can connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarProviderKind {
    Google,
    Microsoft,
}

impl CalendarProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarProviderKind::Google => "google",
            CalendarProviderKind::Microsoft => "microsoft",
        }
    }

    /// Parse a provider path segment, `None` for anything unsupported
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "google" => Some(CalendarProviderKind::Google),
            "microsoft" => Some(CalendarProviderKind::Microsoft),
            _ => None,
        }
    }
}

/// A calendar account connected by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedCalendarProvider {
    pub provider: CalendarProviderKind,
    pub account_email: String,
    pub token_encrypted: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Connected account as exposed to clients, without the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub provider: CalendarProviderKind,
    pub account_email: String,
    pub scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ConnectedCalendarProvider> for ConnectedAccount {
    fn from(value: &ConnectedCalendarProvider) -> Self {
        Self {
            provider: value.provider,
            account_email: value.account_email.clone(),
            scopes: value.scopes.clone(),
            created_at: value.created_at,
        }
    }
}

/// A shared group search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub owner_user_id: String,
    pub created_at: DateTime<Utc>,
    pub participant_user_ids: Vec<String>,
}

/// Audit log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event: String,
    pub payload: serde_json::Value,
    pub ts: DateTime<Utc>,
}
