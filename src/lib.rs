//! Gameday Advisor - family outing recommender
//!
//! Ranks upcoming games for a caller, or for every member of a shared plan,
//! against their calendars, ticket prices and preferences.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod providers;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{is_available, score_event, SearchOptions, SearchOrchestrator};
pub use error::AppError;
pub use models::{Event, Preferences, ScoringWeights, SearchResponse, SearchResult, TicketSummary};
