use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{Event, PriceBand, TicketSummary};
use crate::providers::{ProviderError, TicketProvider};

/// Public SeatGeek API root
pub const SEATGEEK_BASE_URL: &str = "https://api.seatgeek.com/2";

/// Words joining the two sides of a short title
const TITLE_JOINERS: [&str; 5] = ["vs.", "vs", "at", "@", "-"];

/// Estimated fees on top of the median ticket price
const FEE_MULTIPLIER: f64 = 1.25;

#[derive(Debug, Deserialize)]
struct EventsPayload {
    #[serde(default)]
    events: Vec<SeatGeekEvent>,
}

#[derive(Debug, Deserialize)]
struct SeatGeekEvent {
    id: u64,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    short_title: Option<String>,
    datetime_utc: String,
    #[serde(default)]
    venue: Option<SeatGeekVenue>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    stats: Option<SeatGeekStats>,
}

#[derive(Debug, Deserialize)]
struct SeatGeekVenue {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    location: Option<SeatGeekLocation>,
}

#[derive(Debug, Deserialize)]
struct SeatGeekLocation {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct SeatGeekStats {
    #[serde(default)]
    lowest_price: Option<f64>,
    #[serde(default)]
    median_price: Option<f64>,
    #[serde(default)]
    listing_count: Option<u32>,
}

/// SeatGeek-backed schedule and ticket provider
pub struct SeatGeekProvider {
    base_url: String,
    client_id: String,
    client_secret: String,
    client: Client,
}

impl SeatGeekProvider {
    /// Create a provider against the public API
    pub fn new(client_id: String, client_secret: String, timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(SEATGEEK_BASE_URL.to_string(), client_id, client_secret, timeout)
    }

    pub fn with_base_url(
        base_url: String,
        client_id: String,
        client_secret: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            client,
        })
    }

    fn to_event(&self, team: &str, raw: SeatGeekEvent) -> Option<Event> {
        let start = match parse_datetime_utc(&raw.datetime_utc) {
            Some(start) => start,
            None => {
                tracing::warn!(event_id = raw.id, "Skipping SeatGeek event with bad datetime {}", raw.datetime_utc);
                return None;
            }
        };

        let venue = raw.venue.unwrap_or(SeatGeekVenue {
            name: None,
            postal_code: None,
            location: None,
        });
        let (lat, lon) = venue
            .location
            .map(|loc| (loc.lat, loc.lon))
            .unwrap_or((0.0, 0.0));

        Some(Event {
            event_id: raw.id.to_string(),
            league: raw.kind.unwrap_or_else(|| "unknown".to_string()).to_uppercase(),
            team: team.to_string(),
            opponent: opponent_from_title(raw.short_title.as_deref().unwrap_or_default(), team),
            start_time_utc: start,
            end_time_utc: start,
            venue: venue.name.unwrap_or_else(|| "Unknown Venue".to_string()),
            venue_zip: venue.postal_code.unwrap_or_else(|| "00000".to_string()),
            lat,
            lon,
            giveaway_text: None,
            ticket_url: raw.url,
        })
    }
}

#[async_trait]
impl TicketProvider for SeatGeekProvider {
    fn name(&self) -> &'static str {
        "seatgeek"
    }

    async fn list_games(
        &self,
        team: &str,
        date_start: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Result<Vec<Event>, ProviderError> {
        let url = format!("{}/events", self.base_url);
        let gte = date_start.to_rfc3339();
        let lte = date_end.to_rfc3339();

        tracing::debug!(team = %team, "Listing SeatGeek events");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("q", team),
                ("datetime_utc.gte", gte.as_str()),
                ("datetime_utc.lte", lte.as_str()),
                ("per_page", "20"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Failed to list events: {}",
                response.status()
            )));
        }

        let payload: EventsPayload = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse events: {}", e)))?;

        Ok(payload
            .events
            .into_iter()
            .filter_map(|raw| self.to_event(team, raw))
            .collect())
    }

    async fn search_tickets(
        &self,
        event_id: &str,
        party_size: u32,
        band: PriceBand,
    ) -> Result<Option<TicketSummary>, ProviderError> {
        let url = format!("{}/events/{}", self.base_url, urlencoding::encode(event_id));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Failed to fetch event {}: {}",
                event_id,
                response.status()
            )));
        }

        let raw: SeatGeekEvent = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse event: {}", e)))?;

        Ok(ticket_from_stats(
            event_id,
            party_size,
            band,
            raw.stats.unwrap_or_default(),
            raw.url,
        ))
    }
}

fn ticket_from_stats(
    event_id: &str,
    party_size: u32,
    band: PriceBand,
    stats: SeatGeekStats,
    url: Option<String>,
) -> Option<TicketSummary> {
    let lowest = stats.lowest_price.filter(|p| *p > 0.0);
    let median = stats
        .median_price
        .filter(|p| *p > 0.0)
        .or(lowest)
        .unwrap_or(0.0);

    if !band.contains(median) {
        return None;
    }

    Some(TicketSummary {
        event_id: event_id.to_string(),
        min_price: lowest.unwrap_or(median),
        median_price: median,
        availability_count: stats.listing_count.unwrap_or(0),
        estimated_total: median * f64::from(party_size) * FEE_MULTIPLIER,
        best_value_score: (100.0 - median).max(0.0),
        deep_link: url.unwrap_or_default(),
    })
}

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC
fn parse_datetime_utc(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Opponent name from a short title such as "Yankees vs. Red Sox"
pub fn opponent_from_title(title: &str, team: &str) -> String {
    let without_team = if team.is_empty() { title.to_string() } else { title.replace(team, "") };
    let mut rest = without_team.as_str();

    loop {
        let before = rest;
        rest = rest.trim();
        for joiner in TITLE_JOINERS {
            if let Some(stripped) = rest.strip_prefix(joiner) {
                if stripped.is_empty() || stripped.starts_with(char::is_whitespace) {
                    rest = stripped;
                }
            }
            if let Some(stripped) = rest.strip_suffix(joiner) {
                if stripped.is_empty() || stripped.ends_with(char::is_whitespace) {
                    rest = stripped;
                }
            }
        }
        if rest == before {
            return rest.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_from_title() {
        assert_eq!(opponent_from_title("Yankees vs. Red Sox", "Yankees"), "Red Sox");
        assert_eq!(
            opponent_from_title("Boston Red Sox at New York Yankees", "New York Yankees"),
            "Boston Red Sox"
        );
        assert_eq!(opponent_from_title("Yankees - Athletics", "Yankees"), "Athletics");
        assert_eq!(opponent_from_title("Yankees vs Mets", "Yankees"), "Mets");
    }

    #[test]
    fn test_parse_datetime_utc() {
        let naive = parse_datetime_utc("2026-06-05T23:05:00").unwrap();
        let zoned = parse_datetime_utc("2026-06-05T23:05:00Z").unwrap();
        assert_eq!(naive, zoned);
        assert!(parse_datetime_utc("tomorrow").is_none());
    }

    #[test]
    fn test_ticket_from_stats_falls_back_to_lowest() {
        let band = PriceBand { low: 10.0, high: 200.0 };
        let stats = SeatGeekStats {
            lowest_price: Some(40.0),
            median_price: None,
            listing_count: Some(12),
        };

        let ticket = ticket_from_stats("123", 2, band, stats, None).unwrap();
        assert_eq!(ticket.median_price, 40.0);
        assert_eq!(ticket.min_price, 40.0);
        assert_eq!(ticket.estimated_total, 100.0);
        assert_eq!(ticket.best_value_score, 60.0);
        assert_eq!(ticket.deep_link, "");
    }

    #[test]
    fn test_ticket_outside_band_is_absent() {
        let band = PriceBand { low: 10.0, high: 50.0 };
        let stats = SeatGeekStats {
            lowest_price: Some(45.0),
            median_price: Some(80.0),
            listing_count: None,
        };
        assert!(ticket_from_stats("123", 2, band, stats, None).is_none());
    }
}
