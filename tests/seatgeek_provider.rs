// SeatGeek provider tests against a local mock server

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

use gameday_advisor::models::PriceBand;
use gameday_advisor::providers::{ProviderError, SeatGeekProvider, TicketProvider};

fn create_provider(server: &mockito::Server) -> SeatGeekProvider {
    SeatGeekProvider::with_base_url(
        server.url(),
        "client-id".to_string(),
        "client-secret".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn band() -> PriceBand {
    PriceBand { low: 30.0, high: 360.0 }
}

#[tokio::test]
async fn test_list_games_maps_events() {
    let mut server = mockito::Server::new_async().await;
    let body = json!({
        "events": [
            {
                "id": 6123401,
                "type": "mlb",
                "short_title": "Yankees vs. Red Sox",
                "datetime_utc": "2027-04-17T23:05:00",
                "venue": {
                    "name": "Yankee Stadium",
                    "postal_code": "10451",
                    "location": { "lat": 40.8296, "lon": -73.9262 }
                },
                "url": "https://seatgeek.com/yankees-vs-red-sox/6123401"
            },
            {
                "id": 6123402,
                "type": "mlb",
                "short_title": "Yankees at Orioles",
                "datetime_utc": "TBD"
            }
        ]
    });

    let mock = server
        .mock("GET", "/events")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "client-id".into()),
            Matcher::UrlEncoded("q".into(), "Yankees".into()),
            Matcher::UrlEncoded("per_page".into(), "20".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let start = Utc.with_ymd_and_hms(2027, 4, 1, 0, 0, 0).unwrap();
    let games = create_provider(&server)
        .list_games("Yankees", start, start + ChronoDuration::days(30))
        .await
        .unwrap();

    mock.assert_async().await;

    // The event without a parseable start is skipped
    assert_eq!(games.len(), 1);
    let game = &games[0];
    assert_eq!(game.event_id, "6123401");
    assert_eq!(game.league, "MLB");
    assert_eq!(game.team, "Yankees");
    assert_eq!(game.opponent, "Red Sox");
    assert_eq!(game.start_time_utc, Utc.with_ymd_and_hms(2027, 4, 17, 23, 5, 0).unwrap());
    assert_eq!(game.end_time_utc, game.start_time_utc);
    assert_eq!(game.venue_zip, "10451");
    assert!(game.giveaway_text.is_none());
    assert_eq!(game.ticket_url.as_deref(), Some("https://seatgeek.com/yankees-vs-red-sox/6123401"));
}

#[tokio::test]
async fn test_search_tickets_estimates_party_total() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/events/6123401")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 6123401,
                "datetime_utc": "2027-04-17T23:05:00",
                "url": "https://seatgeek.com/e/6123401",
                "stats": { "lowest_price": 35.0, "median_price": 60.0, "listing_count": 80 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let ticket = create_provider(&server)
        .search_tickets("6123401", 2, band())
        .await
        .unwrap()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(ticket.min_price, 35.0);
    assert_eq!(ticket.median_price, 60.0);
    assert_eq!(ticket.availability_count, 80);
    assert_eq!(ticket.estimated_total, 150.0);
    assert_eq!(ticket.best_value_score, 40.0);
    assert_eq!(ticket.deep_link, "https://seatgeek.com/e/6123401");
}

#[tokio::test]
async fn test_search_tickets_outside_band_is_none() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/events/6123401")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "id": 6123401,
                "datetime_utc": "2027-04-17T23:05:00",
                "stats": { "lowest_price": 300.0, "median_price": 420.0 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let ticket = create_provider(&server).search_tickets("6123401", 2, band()).await.unwrap();
    assert!(ticket.is_none());
}

#[tokio::test]
async fn test_event_id_is_url_encoded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/events/abc%2F1")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let result = create_provider(&server).search_tickets("abc/1", 2, band()).await;

    mock.assert_async().await;
    assert!(matches!(result, Err(ProviderError::ApiError(_))));
}

#[tokio::test]
async fn test_upstream_errors_surface() {
    let mut server = mockito::Server::new_async().await;
    let _failing = server
        .mock("GET", "/events")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    let _garbled = server
        .mock("GET", "/events/1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let provider = create_provider(&server);
    let start = Utc::now();

    let listed = provider.list_games("Yankees", start, start + ChronoDuration::days(7)).await;
    assert!(matches!(listed, Err(ProviderError::ApiError(_))));

    let quoted = provider.search_tickets("1", 2, band()).await;
    assert!(matches!(quoted, Err(ProviderError::InvalidResponse(_))));
}
