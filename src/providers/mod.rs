//! Calendar and ticket data sources consumed by the search pipeline.
//!
//! Implementations are chosen once at startup and shared behind `Arc<dyn ..>`.

pub mod calendar;
pub mod seatgeek;
pub mod tickets;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{BusyInterval, Event, PriceBand, TicketSummary};

pub use calendar::FixtureCalendarProvider;
pub use seatgeek::SeatGeekProvider;
pub use tickets::FixtureTicketProvider;

/// Errors that can occur when talking to an upstream provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Fixture error: {0}")]
    Fixture(String),
}

/// Source of free/busy data for calendar accounts
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Busy intervals of `accounts` overlapping `[time_min, time_max)`
    async fn get_free_busy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        accounts: &[String],
    ) -> Result<Vec<BusyInterval>, ProviderError>;
}

/// Source of event schedules and ticket quotes
#[async_trait]
pub trait TicketProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Events of `team` starting within the date window
    async fn list_games(
        &self,
        team: &str,
        date_start: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Result<Vec<Event>, ProviderError>;

    /// Ticket quote for a party within a price band, if any
    async fn search_tickets(
        &self,
        event_id: &str,
        party_size: u32,
        band: PriceBand,
    ) -> Result<Option<TicketSummary>, ProviderError>;
}
