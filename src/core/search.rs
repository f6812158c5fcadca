use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{availability::is_available, scoring::score_event};
use crate::error::AppError;
use crate::models::{
    BusyInterval, Event, Preferences, PriceBand, ScoringWeights, SearchResponse, SearchResult, TicketSummary,
};
use crate::providers::{CalendarProvider, ProviderError, TicketProvider};
use crate::services::{BoundedCache, CacheKey, RateLimiter, Store};

/// Number of results surfaced as the headline picks
pub const TOP_PICKS: usize = 3;

/// Tunables of the search pipeline
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Searches allowed per caller per window
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    /// Upper bound on a single provider call
    pub provider_timeout: Duration,
    /// Distance assumed for every venue until geocoding exists
    pub placeholder_distance_miles: f64,
    /// Team searched when the preferences name none
    pub default_team: String,
    /// Calendar account used for a solo caller with no connections
    pub placeholder_account: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            rate_limit: 30,
            rate_window_secs: 60,
            provider_timeout: Duration::from_secs(20),
            placeholder_distance_miles: 10.0,
            default_team: "Yankees".to_string(),
            placeholder_account: "demo@example.com".to_string(),
        }
    }
}

/// Search orchestrator - runs the recommendation pipeline for one caller
///
/// # Pipeline Stages
/// 1. Rate limit the caller
/// 2. Resolve participants (solo caller or every member of a plan)
/// 3. Fetch busy intervals per participant
/// 4. Fetch candidate games through the games cache
/// 5. Availability, ticket, budget and giveaway filtering
/// 6. Scoring and stable ranking
pub struct SearchOrchestrator {
    store: Arc<dyn Store>,
    calendar: Arc<dyn CalendarProvider>,
    tickets: Arc<dyn TicketProvider>,
    games_cache: Arc<BoundedCache<Vec<Event>>>,
    tickets_cache: Arc<BoundedCache<TicketSummary>>,
    limiter: Arc<RateLimiter>,
    weights: ScoringWeights,
    options: SearchOptions,
}

impl SearchOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn Store>,
        calendar: Arc<dyn CalendarProvider>,
        tickets: Arc<dyn TicketProvider>,
        games_cache: Arc<BoundedCache<Vec<Event>>>,
        tickets_cache: Arc<BoundedCache<TicketSummary>>,
        limiter: Arc<RateLimiter>,
        weights: ScoringWeights,
        options: SearchOptions,
    ) -> Self {
        Self {
            store,
            calendar,
            tickets,
            games_cache,
            tickets_cache,
            limiter,
            weights,
            options,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Name of the ticket provider in use
    pub fn ticket_provider(&self) -> &'static str {
        self.tickets.name()
    }

    /// Rank games for `caller`, alone or together with a plan's participants
    ///
    /// # Errors
    /// * `RateLimited` when the caller exhausted the search budget
    /// * `NotFound` when `plan_id` names no plan
    /// * `BadRequest` when a plan participant has no connected calendar
    ///
    /// Provider failures and timeouts degrade to empty data instead.
    pub async fn search(
        &self,
        preferences: &Preferences,
        plan_id: Option<&str>,
        caller: &str,
    ) -> Result<SearchResponse, AppError> {
        let key = RateLimiter::search_key(caller);
        if !self
            .limiter
            .hit(&key, self.options.rate_limit, self.options.rate_window_secs)
        {
            tracing::info!(user_id = %caller, "Search rejected by rate limit");
            return Err(AppError::RateLimited("search rate limit exceeded".to_string()));
        }

        self.store
            .log(
                "search_run",
                serde_json::json!({
                    "team": preferences.team_text.as_deref().or(preferences.team_id.as_deref()),
                    "plan_id": plan_id,
                    "user_id": caller,
                }),
            )
            .await?;

        let participants = self.resolve_participants(plan_id, caller).await?;
        let busy = self.busy_by_participant(preferences, &participants, plan_id.is_some()).await?;

        let team = preferences.team_query(&self.options.default_team);
        let games = self.games(team, preferences).await;

        tracing::debug!(
            team = %team,
            participants = participants.len(),
            candidates = games.len(),
            "Scoring candidate games"
        );

        let band = preferences.price_band();
        let mut ranked: Vec<SearchResult> = Vec::new();

        for game in &games {
            let available_for_all = participants.iter().all(|pid| {
                busy.get(pid)
                    .map_or(true, |intervals| is_available(game, intervals, preferences))
            });
            if !available_for_all {
                continue;
            }

            let Some(ticket) = self.ticket(game, preferences.party_size, band).await else {
                continue;
            };
            if ticket.estimated_total > preferences.budget_total {
                continue;
            }
            if preferences.giveaway_only && game.giveaway().is_none() {
                continue;
            }

            let mut result = score_event(
                game,
                &ticket,
                preferences,
                self.options.placeholder_distance_miles,
                &self.weights,
            );
            if plan_id.is_some() {
                result
                    .why_recommended
                    .push(format!("All {} participants are available", participants.len()));
            }
            ranked.push(result);
        }

        rank(&mut ranked);

        tracing::info!(
            user_id = %caller,
            plan_id = ?plan_id,
            results = ranked.len(),
            "Search completed"
        );

        Ok(SearchResponse {
            top_three: ranked.iter().take(TOP_PICKS).cloned().collect(),
            ranked,
            scoring_weights: self.weights,
        })
    }

    async fn resolve_participants(
        &self,
        plan_id: Option<&str>,
        caller: &str,
    ) -> Result<Vec<String>, AppError> {
        let Some(plan_id) = plan_id else {
            return Ok(vec![caller.to_string()]);
        };

        match self.store.get_plan(plan_id).await? {
            Some(plan) => Ok(plan.participant_user_ids),
            None => {
                tracing::info!(plan_id = %plan_id, "Search for unknown plan");
                Err(AppError::NotFound("plan not found".to_string()))
            }
        }
    }

    /// Busy intervals keyed by participant
    ///
    /// A plan participant without connected calendars fails the search.
    async fn busy_by_participant(
        &self,
        preferences: &Preferences,
        participants: &[String],
        group: bool,
    ) -> Result<HashMap<String, Vec<BusyInterval>>, AppError> {
        let mut busy = HashMap::with_capacity(participants.len());

        for pid in participants {
            let mut accounts: Vec<String> = self
                .store
                .get_user_providers(pid)
                .await?
                .into_iter()
                .map(|p| p.account_email)
                .collect();

            if accounts.is_empty() {
                if group {
                    tracing::info!(user_id = %pid, "Plan participant has no connected calendars");
                    return Err(AppError::BadRequest(format!(
                        "participant {} has no connected calendars",
                        pid
                    )));
                }
                accounts.push(self.options.placeholder_account.clone());
            }

            let intervals = self
                .bounded("calendar", async {
                    self.calendar
                        .get_free_busy(preferences.date_start, preferences.date_end, &accounts)
                        .await
                })
                .await
                .unwrap_or_default();

            busy.insert(pid.clone(), intervals);
        }

        Ok(busy)
    }

    async fn games(&self, team: &str, preferences: &Preferences) -> Vec<Event> {
        let key = CacheKey::games(team, preferences.date_start, preferences.date_end);
        if let Some(games) = self.games_cache.get(&key).await {
            return games;
        }

        // A failed call degrades this search only; nothing is cached for it
        let Some(games) = self
            .bounded("games", async {
                self.tickets
                    .list_games(team, preferences.date_start, preferences.date_end)
                    .await
            })
            .await
        else {
            return Vec::new();
        };

        self.games_cache.set(&key, games.clone()).await;
        games
    }

    /// Ticket quote for a game; only found quotes are cached
    async fn ticket(
        &self,
        game: &Event,
        party_size: u32,
        band: PriceBand,
    ) -> Option<TicketSummary> {
        let key = CacheKey::ticket(&game.event_id, party_size, band.low, band.high);
        if let Some(ticket) = self.tickets_cache.get(&key).await {
            return Some(ticket);
        }

        let ticket = self
            .bounded("tickets", async {
                self.tickets.search_tickets(&game.event_id, party_size, band).await
            })
            .await
            .flatten()?;

        self.tickets_cache.set(&key, ticket.clone()).await;
        Some(ticket)
    }

    /// Run a provider call under the configured timeout
    ///
    /// Returns `None` on failure or timeout.
    async fn bounded<T, F>(&self, call: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.options.provider_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(call = call, error = %e, "Provider call failed, degrading to empty result");
                None
            }
            Err(_) => {
                tracing::warn!(
                    call = call,
                    timeout_secs = self.options.provider_timeout.as_secs(),
                    "Provider call timed out, degrading to empty result"
                );
                None
            }
        }
    }
}

/// Sort results by score, highest first
///
/// The sort is stable so tied scores keep their candidate order.
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
