use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

use crate::models::{Event, PriceBand, TicketSummary};
use crate::providers::{ProviderError, TicketProvider};

#[derive(Debug, Default, Deserialize)]
struct ScheduleFixture {
    #[serde(default)]
    games: Vec<Event>,
    #[serde(default)]
    tickets: Vec<TicketSummary>,
}

/// Ticket provider serving schedules and quotes from a fixture document
///
/// Fixture shape: `{ "games": [Event..], "tickets": [TicketSummary..] }`
#[derive(Debug, Default)]
pub struct FixtureTicketProvider {
    games: Vec<Event>,
    tickets: Vec<TicketSummary>,
}

impl FixtureTicketProvider {
    pub fn new(games: Vec<Event>, tickets: Vec<TicketSummary>) -> Self {
        Self { games, tickets }
    }

    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let fixture: ScheduleFixture = serde_json::from_str(json)
            .map_err(|e| ProviderError::Fixture(format!("Failed to parse schedule fixture: {}", e)))?;
        Ok(Self::new(fixture.games, fixture.tickets))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Fixture(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[async_trait]
impl TicketProvider for FixtureTicketProvider {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn list_games(
        &self,
        team: &str,
        date_start: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Result<Vec<Event>, ProviderError> {
        let team = team.to_lowercase();
        Ok(self
            .games
            .iter()
            .filter(|game| game.team.to_lowercase() == team)
            .filter(|game| date_start <= game.start_time_utc && game.start_time_utc <= date_end)
            .cloned()
            .collect())
    }

    async fn search_tickets(
        &self,
        event_id: &str,
        _party_size: u32,
        band: PriceBand,
    ) -> Result<Option<TicketSummary>, ProviderError> {
        Ok(self
            .tickets
            .iter()
            .find(|ticket| ticket.event_id == event_id && band.contains(ticket.median_price))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "games": [
            {
                "event_id": "nyy-1", "league": "MLB", "team": "Yankees", "opponent": "Red Sox",
                "start_time_utc": "2026-06-05T23:05:00Z", "end_time_utc": "2026-06-06T02:05:00Z",
                "venue": "Yankee Stadium", "venue_zip": "10451", "lat": 40.8296, "lon": -73.9262,
                "giveaway_text": "Bobblehead Night"
            },
            {
                "event_id": "nyy-2", "league": "MLB", "team": "Yankees", "opponent": "Orioles",
                "start_time_utc": "2026-07-05T17:05:00Z", "end_time_utc": "2026-07-05T20:05:00Z",
                "venue": "Yankee Stadium", "venue_zip": "10451", "lat": 40.8296, "lon": -73.9262
            }
        ],
        "tickets": [
            {
                "event_id": "nyy-1", "min_price": 30.0, "median_price": 55.0, "availability_count": 420,
                "estimated_total": 137.5, "best_value_score": 45.0, "deep_link": "https://tickets.example/nyy-1"
            }
        ]
    }"#;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            "2026-06-01T00:00:00Z".parse().unwrap(),
            "2026-06-30T00:00:00Z".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_list_games_matches_team_case_insensitively() {
        let provider = FixtureTicketProvider::from_json(FIXTURE).unwrap();
        let (start, end) = window();

        let games = provider.list_games("yankees", start, end).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].event_id, "nyy-1");

        assert!(provider.list_games("Mets", start, end).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_tickets_respects_band() {
        let provider = FixtureTicketProvider::from_json(FIXTURE).unwrap();

        let inside = PriceBand { low: 30.0, high: 360.0 };
        let ticket = provider.search_tickets("nyy-1", 2, inside).await.unwrap();
        assert_eq!(ticket.unwrap().estimated_total, 137.5);

        let below = PriceBand { low: 60.0, high: 360.0 };
        assert!(provider.search_tickets("nyy-1", 2, below).await.unwrap().is_none());
        assert!(provider.search_tickets("nyy-2", 2, inside).await.unwrap().is_none());
    }
}
