// Unit tests for Gameday Advisor

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use gameday_advisor::core::{
    availability::{is_available, occupied_window},
    scoring::{calculate_price_score, calculate_travel_score, score_event},
    search::rank,
};
use gameday_advisor::models::{BusyInterval, Event, Preferences, ScoringWeights, TicketSummary};
use gameday_advisor::services::{BoundedCache, CacheKey, ManualClock, RateLimiter};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2027, 4, 17, hour, minute, 0).unwrap()
}

fn create_test_event(id: &str, start: DateTime<Utc>, giveaway: Option<&str>) -> Event {
    Event {
        event_id: id.to_string(),
        league: "MLB".to_string(),
        team: "Yankees".to_string(),
        opponent: "Red Sox".to_string(),
        start_time_utc: start,
        end_time_utc: start + Duration::hours(3),
        venue: "Yankee Stadium".to_string(),
        venue_zip: "10451".to_string(),
        lat: 40.8296,
        lon: -73.9262,
        giveaway_text: giveaway.map(str::to_string),
        ticket_url: None,
    }
}

fn create_test_ticket(id: &str, estimated_total: f64) -> TicketSummary {
    TicketSummary {
        event_id: id.to_string(),
        min_price: 25.0,
        median_price: 40.0,
        availability_count: 80,
        estimated_total,
        best_value_score: 60.0,
        deep_link: String::new(),
    }
}

fn create_test_preferences() -> Preferences {
    let mut prefs = Preferences::with_window(at(0, 0), at(0, 0) + Duration::days(30));
    prefs.budget_total = 300.0;
    prefs
}

#[test]
fn test_empty_calendar_is_always_available() {
    let prefs = create_test_preferences();
    for hour in [0, 9, 13, 20] {
        let event = create_test_event("g", at(hour, 0), None);
        assert!(is_available(&event, &[], &prefs));
    }
}

#[test]
fn test_buffered_window_touching_busy_interval() {
    let prefs = create_test_preferences();
    let event = create_test_event("g", at(17, 0), None);
    let (start, end) = occupied_window(&event, &prefs).unwrap();
    assert_eq!(start, at(16, 0));
    assert_eq!(end, at(21, 30));

    let before = BusyInterval { start: at(14, 0), end: start };
    let after = BusyInterval { start: end, end: at(23, 0) };
    assert!(is_available(&event, &[before, after], &prefs));

    let crossing = BusyInterval { start: at(21, 29), end: at(23, 0) };
    assert!(!is_available(&event, &[before, crossing], &prefs));
}

#[test]
fn test_weights_sum_to_one() {
    let weights = ScoringWeights::default();
    assert!((weights.total() - 1.0).abs() < 1e-9);
    assert!(weights.is_normalized());
}

#[test]
fn test_score_deterministic_and_bounded() {
    let weights = ScoringWeights::default();
    let mut prefs = create_test_preferences();
    prefs.giveaway_keywords = vec!["bobblehead".to_string()];

    for (total, distance) in [(0.0, 0.0), (150.0, 25.0), (300.0, 50.0), (900.0, 400.0)] {
        let event = create_test_event("g", at(17, 5), Some("Bobblehead Night"));
        let ticket = create_test_ticket("g", total);

        let first = score_event(&event, &ticket, &prefs, distance, &weights);
        let second = score_event(&event, &ticket, &prefs, distance, &weights);

        assert_eq!(first.score, second.score);
        assert_eq!(first.why_recommended, second.why_recommended);
        assert!(first.score >= 0.0 && first.score <= 1.0, "score out of range: {}", first.score);
    }
}

#[test]
fn test_rationale_order() {
    let mut prefs = create_test_preferences();
    prefs.giveaway_keywords = vec!["cap".to_string()];
    let event = create_test_event("g", at(17, 5), Some("Kids Cap Giveaway"));

    let result = score_event(&event, &create_test_ticket("g", 60.0), &prefs, 5.0, &ScoringWeights::default());
    assert_eq!(
        result.why_recommended,
        vec![
            "Fits your budget comfortably",
            "Matches giveaway keyword(s): cap",
            "Within travel distance preference",
        ]
    );
}

#[test]
fn test_sub_scores_clamped() {
    assert_eq!(calculate_price_score(1_000.0, 100.0), 0.0);
    assert_eq!(calculate_price_score(-50.0, 100.0), 1.0);
    assert_eq!(calculate_travel_score(100.0, 50.0), 0.0);
    assert_eq!(calculate_travel_score(50.0, 50.0), 0.0);
}

#[test]
fn test_ranking_descending_with_top_three_prefix() {
    let prefs = create_test_preferences();
    let weights = ScoringWeights::default();
    let mut ranked: Vec<_> = [250.0, 50.0, 150.0, 50.0, 10.0]
        .iter()
        .enumerate()
        .map(|(i, total)| {
            let id = format!("g{}", i);
            score_event(&create_test_event(&id, at(17, 0), None), &create_test_ticket(&id, *total), &prefs, 10.0, &weights)
        })
        .collect();

    rank(&mut ranked);

    let ids: Vec<&str> = ranked.iter().map(|r| r.event.event_id.as_str()).collect();
    // g1 and g3 tie and keep their candidate order
    assert_eq!(ids, vec!["g4", "g1", "g3", "g2", "g0"]);

    let top_three: Vec<_> = ranked.iter().take(3).collect();
    assert!(top_three.iter().zip(ranked.iter()).all(|(a, b)| *a == b));
}

#[tokio::test]
async fn test_cache_expiry_frees_storage() {
    let clock = Arc::new(ManualClock::new(at(12, 0)));
    let cache: BoundedCache<Vec<Event>> = BoundedCache::with_clock(900, clock.clone());
    let key = CacheKey::games("Yankees", at(0, 0), at(23, 0));
    let games = vec![create_test_event("g", at(17, 0), None)];

    cache.set(&key, games.clone()).await;
    clock.advance(Duration::seconds(899));
    assert_eq!(cache.get(&key).await, Some(games));

    clock.advance(Duration::seconds(2));
    assert_eq!(cache.get(&key).await, None);
    assert!(!cache.contains_key(&key));
}

#[test]
fn test_rate_limiter_window() {
    let clock = Arc::new(ManualClock::new(at(12, 0)));
    let limiter = RateLimiter::with_clock(clock.clone());
    let key = RateLimiter::search_key("alex");

    for _ in 0..30 {
        assert!(limiter.hit(&key, 30, 60));
    }
    assert!(!limiter.hit(&key, 30, 60));

    clock.advance(Duration::seconds(61));
    assert!(limiter.hit(&key, 30, 60));
    assert_eq!(limiter.window(&key).map(|w| w.count), Some(1));
}
