use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::SearchOptions;
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Comma-separated list of allowed origins
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self { origins: default_cors_origins() }
    }
}

impl CorsSettings {
    /// Allowed origins, falling back to the local frontend
    pub fn origin_list(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            vec![default_cors_origins()]
        } else {
            origins
        }
    }
}

fn default_cors_origins() -> String { "http://localhost:5173".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecuritySettings {
    /// Base64 AES-256 key for calendar tokens
    pub token_key: Option<String>,
}

/// Ticket provider requested in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketProviderKind {
    Fixture,
    Seatgeek,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Unset picks SeatGeek whenever credentials are present
    pub ticket: Option<TicketProviderKind>,
    pub seatgeek_client_id: Option<String>,
    pub seatgeek_client_secret: Option<String>,
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            ticket: None,
            seatgeek_client_id: None,
            seatgeek_client_secret: None,
            fixtures_dir: default_fixtures_dir(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl ProviderSettings {
    /// SeatGeek credentials when both are present and non-empty
    pub fn seatgeek_credentials(&self) -> Option<(String, String)> {
        let id = self.seatgeek_client_id.as_deref().filter(|v| !v.is_empty())?;
        let secret = self.seatgeek_client_secret.as_deref().filter(|v| !v.is_empty())?;
        Some((id.to_string(), secret.to_string()))
    }

    /// Whether SeatGeek should serve tickets
    ///
    /// Credentials enable it unless the provider is forced to `fixture`.
    pub fn use_seatgeek(&self) -> bool {
        self.seatgeek_credentials().is_some() && self.ticket != Some(TicketProviderKind::Fixture)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_fixtures_dir() -> String { "fixtures".to_string() }
fn default_provider_timeout() -> u64 { 20 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub games_ttl_secs: u64,
    #[serde(default = "default_cache_ttl")]
    pub tickets_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            games_ttl_secs: default_cache_ttl(),
            tickets_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_ttl() -> u64 { 900 }

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_search_per_minute")]
    pub search_per_minute: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            search_per_minute: default_search_per_minute(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_search_per_minute() -> u32 { 30 }
fn default_window_secs() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_team")]
    pub default_team: String,
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
    #[serde(default = "default_placeholder_account")]
    pub placeholder_account: String,
    #[serde(default = "default_placeholder_distance")]
    pub placeholder_distance_miles: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_team: default_team(),
            default_user_id: default_user_id(),
            placeholder_account: default_placeholder_account(),
            placeholder_distance_miles: default_placeholder_distance(),
        }
    }
}

fn default_team() -> String { "Yankees".to_string() }
fn default_user_id() -> String { "demo-user".to_string() }
fn default_placeholder_account() -> String { "demo@example.com".to_string() }
fn default_placeholder_distance() -> f64 { 10.0 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_price_value_weight")]
    pub price_value: f64,
    #[serde(default = "default_giveaway_weight")]
    pub giveaway: f64,
    #[serde(default = "default_day_time_weight")]
    pub day_time: f64,
    #[serde(default = "default_travel_weight")]
    pub travel: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            price_value: default_price_value_weight(),
            giveaway: default_giveaway_weight(),
            day_time: default_day_time_weight(),
            travel: default_travel_weight(),
            availability: default_availability_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        ScoringWeights {
            price_value: config.price_value,
            giveaway: config.giveaway,
            day_time: config.day_time,
            travel: config.travel,
            availability: config.availability,
        }
    }
}

fn default_price_value_weight() -> f64 { 0.35 }
fn default_giveaway_weight() -> f64 { 0.20 }
fn default_day_time_weight() -> f64 { 0.20 }
fn default_travel_weight() -> f64 { 0.15 }
fn default_availability_weight() -> f64 { 0.10 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL URL; the in-memory store is used when unset
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

/// Un-prefixed environment variables and the keys they override
const ENV_OVERRIDES: [(&str, &str); 8] = [
    ("DATABASE_URL", "database.url"),
    ("TOKEN_ENCRYPTION_KEY", "security.token_key"),
    ("SEATGEEK_CLIENT_ID", "providers.seatgeek_client_id"),
    ("SEATGEEK_CLIENT_SECRET", "providers.seatgeek_client_secret"),
    ("SEARCH_RATE_LIMIT_PER_MINUTE", "rate_limit.search_per_minute"),
    ("GAMES_CACHE_TTL_SECONDS", "cache.games_ttl_secs"),
    ("TICKETS_CACHE_TTL_SECONDS", "cache.tickets_ttl_secs"),
    ("CORS_ORIGINS", "cors.origins"),
];

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with GAMEDAY_)
    /// 5. Well-known variables such as DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., GAMEDAY__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("GAMEDAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = apply_env_overrides(settings)?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("GAMEDAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self.scoring_weights();
        if !weights.is_normalized() {
            return Err(ConfigError::Message(format!(
                "scoring weights must sum to 1.0, got {:.3}",
                weights.total()
            )));
        }
        if self.rate_limit.search_per_minute == 0 {
            return Err(ConfigError::Message(
                "rate_limit.search_per_minute must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }

    /// Search pipeline tunables
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            rate_limit: self.rate_limit.search_per_minute,
            rate_window_secs: self.rate_limit.window_secs,
            provider_timeout: self.providers.timeout(),
            placeholder_distance_miles: self.search.placeholder_distance_miles,
            default_team: self.search.default_team.clone(),
            placeholder_account: self.search.placeholder_account.clone(),
        }
    }
}

/// Apply the well-known environment variables on top of loaded settings
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                builder = builder.set_override(key, value)?;
            }
        }
    }

    builder.build()
}
