// Core algorithm exports
pub mod availability;
pub mod scoring;
pub mod search;

pub use availability::{is_available, occupied_window};
pub use scoring::{calculate_day_time_score, calculate_giveaway_score, calculate_price_score, calculate_travel_score, score_event};
pub use search::{rank, SearchOptions, SearchOrchestrator, TOP_PICKS};
