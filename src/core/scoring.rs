use chrono::{Datelike, Timelike};
use crate::models::{Event, Preferences, ScoringWeights, SearchResult, TicketSummary, TimeOfDay};

/// Giveaway score when the caller wants giveaway games only and the event has none
///
/// Clamped to zero before weighting; exclusion happens in the search filter.
pub const GIVEAWAY_REQUIRED_MISSING: f64 = -1.0;

/// Giveaway score for any giveaway when the caller named no keywords
const UNFILTERED_GIVEAWAY_SCORE: f64 = 0.7;

/// Indicator value when a day or time preference is not met
const MISSED_PREFERENCE_SCORE: f64 = 0.3;

/// Score an event and explain the score
///
/// Scoring formula:
/// score = (
///     price_score * 0.35 +         # Cheaper relative to budget = higher
///     giveaway_score * 0.20 +      # Keyword matches in the giveaway
///     day_time_score * 0.20 +      # Preferred weekday and time of day
///     travel_score * 0.15 +        # Closer = higher
///     availability * 0.10          # Always 1.0, candidates are pre-filtered
/// )
///
/// Rationale is ordered price, giveaway, travel.
pub fn score_event(
    event: &Event,
    ticket: &TicketSummary,
    preferences: &Preferences,
    distance_miles: f64,
    weights: &ScoringWeights,
) -> SearchResult {
    let mut reasons = Vec::new();

    let price = calculate_price_score(ticket.estimated_total, preferences.budget_total);
    if price > 0.6 {
        reasons.push("Fits your budget comfortably".to_string());
    }

    let (giveaway, matched) = calculate_giveaway_score(event, preferences);
    if !matched.is_empty() {
        reasons.push(format!("Matches giveaway keyword(s): {}", matched.join(", ")));
    }

    let day_time = calculate_day_time_score(event, preferences);

    let travel = calculate_travel_score(distance_miles, preferences.max_miles);
    if distance_miles <= preferences.max_miles {
        reasons.push("Within travel distance preference".to_string());
    }

    let availability = 1.0;

    let total = weights.price_value * price
        + weights.giveaway * giveaway.max(0.0)
        + weights.day_time * day_time
        + weights.travel * travel
        + weights.availability * availability;

    SearchResult {
        event: event.clone(),
        ticket_summary: Some(ticket.clone()),
        score: round_score(total),
        why_recommended: reasons,
    }
}

/// Round a score to three decimal places
#[inline]
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

/// Price score (0-1): share of the budget left after the estimated total
#[inline]
pub fn calculate_price_score(estimated_total: f64, budget_total: f64) -> f64 {
    (1.0 - estimated_total / budget_total.max(1.0)).clamp(0.0, 1.0)
}

/// Giveaway score and the caller keywords found in the giveaway text
///
/// Returns [`GIVEAWAY_REQUIRED_MISSING`] when only giveaway games are wanted
/// and the event has none.
pub fn calculate_giveaway_score(event: &Event, preferences: &Preferences) -> (f64, Vec<String>) {
    let Some(text) = event.giveaway() else {
        let score = if preferences.giveaway_only { GIVEAWAY_REQUIRED_MISSING } else { 0.0 };
        return (score, vec![]);
    };

    if preferences.giveaway_keywords.is_empty() {
        return (UNFILTERED_GIVEAWAY_SCORE, vec![]);
    }

    let text = text.to_lowercase();
    let matched: Vec<String> = preferences
        .giveaway_keywords
        .iter()
        .filter(|keyword| text.contains(&keyword.to_lowercase()))
        .cloned()
        .collect();

    let score = (matched.len() as f64 / preferences.giveaway_keywords.len() as f64).min(1.0);
    (score, matched)
}

/// Day/time score (0.3-1): mean of the weekday and time-of-day indicators
pub fn calculate_day_time_score(event: &Event, preferences: &Preferences) -> f64 {
    let start = event.start_time_utc;

    let weekday = start.weekday().num_days_from_monday();
    let dow = if preferences.dow_prefs.is_empty() || preferences.dow_prefs.contains(&weekday) {
        1.0
    } else {
        MISSED_PREFERENCE_SCORE
    };

    let bucket = TimeOfDay::from_hour(start.hour());
    let tod = if preferences.tod_prefs.is_empty() || preferences.tod_prefs.contains(&bucket) {
        1.0
    } else {
        MISSED_PREFERENCE_SCORE
    };

    (dow + tod) / 2.0
}

/// Travel score (0-1): closer to home is better, zero past the max distance
#[inline]
pub fn calculate_travel_score(distance_miles: f64, max_miles: f64) -> f64 {
    (1.0 - distance_miles / max_miles.max(1.0)).clamp(0.0, 1.0)
}
