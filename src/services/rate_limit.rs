use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::services::clock::{Clock, SystemClock};

/// Counting window of one rate-limit key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub started_at: DateTime<Utc>,
    pub count: u32,
}

/// Fixed-window request throttle
///
/// Each key owns one window. A window older than its duration is replaced
/// on the next hit, and dropped when a hit for a new key arrives, so the map
/// holds at most the keys seen within one window. The check and the increment happen under the key's shard
/// lock, so concurrent hits on one key never over-count.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// Key used to throttle searches of one caller
    pub fn search_key(user_id: &str) -> String {
        format!("search:{}", user_id)
    }

    /// Record a hit for `key`, returning whether it is allowed
    ///
    /// A window resets only once strictly more than `window_secs` have
    /// elapsed since it started. Denied hits do not count.
    pub fn hit(&self, key: &str, limit: u32, window_secs: u64) -> bool {
        let now = self.clock.now();
        let window = Duration::seconds(window_secs.min(i64::MAX as u64 / 1_000) as i64);

        // New keys sweep out windows that have already elapsed
        if !self.windows.contains_key(key) {
            self.windows.retain(|_, w| now - w.started_at <= window);
        }

        match self.windows.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateWindow { started_at: now, count: 1 });
                true
            }
            Entry::Occupied(mut occupied) => {
                let current = occupied.get_mut();
                if now - current.started_at > window {
                    *current = RateWindow { started_at: now, count: 1 };
                    return true;
                }
                if current.count >= limit {
                    tracing::debug!(key = %key, limit = limit, "Rate limit reached");
                    return false;
                }
                current.count += 1;
                true
            }
        }
    }

    /// Number of keys with a recorded window
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Current window of a key, if any
    pub fn window(&self, key: &str) -> Option<RateWindow> {
        self.windows.get(key).map(|w| *w)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use chrono::TimeZone;

    fn limiter() -> (RateLimiter, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap());
        (RateLimiter::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_limit_hits_allowed_then_denied() {
        let (limiter, _clock) = limiter();

        for _ in 0..30 {
            assert!(limiter.hit("search:u1", 30, 60));
        }
        assert!(!limiter.hit("search:u1", 30, 60));
        assert_eq!(limiter.window("search:u1").unwrap().count, 30);
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _clock) = limiter();

        assert!(limiter.hit("search:a", 1, 60));
        assert!(!limiter.hit("search:a", 1, 60));
        assert!(limiter.hit("search:b", 1, 60));
    }

    #[test]
    fn test_boundary_does_not_reset() {
        let (limiter, clock) = limiter();

        assert!(limiter.hit("k", 1, 60));
        clock.advance(Duration::seconds(60));
        assert!(!limiter.hit("k", 1, 60));
    }

    #[test]
    fn test_window_resets_after_elapsed() {
        let (limiter, clock) = limiter();

        assert!(limiter.hit("k", 2, 60));
        assert!(limiter.hit("k", 2, 60));
        assert!(!limiter.hit("k", 2, 60));

        clock.advance(Duration::seconds(61));
        assert!(limiter.hit("k", 2, 60));

        let window = limiter.window("k").unwrap();
        assert_eq!(window.count, 1);
        assert_eq!(window.started_at, clock.now());
    }

    #[test]
    fn test_elapsed_windows_are_dropped() {
        let (limiter, clock) = limiter();

        for i in 0..100 {
            assert!(limiter.hit(&format!("search:rotating-{}", i), 30, 60));
        }
        assert_eq!(limiter.len(), 100);

        clock.advance(Duration::seconds(61));
        assert!(limiter.hit("search:fresh", 30, 60));
        assert_eq!(limiter.len(), 1);
        assert!(limiter.window("search:rotating-0").is_none());
    }

    #[test]
    fn test_live_windows_survive_sweep() {
        let (limiter, clock) = limiter();

        assert!(limiter.hit("k", 1, 60));
        clock.advance(Duration::seconds(30));
        assert!(limiter.hit("other", 1, 60));
        assert!(!limiter.hit("k", 1, 60));
    }

    #[test]
    fn test_search_key() {
        assert_eq!(RateLimiter::search_key("demo-user"), "search:demo-user");
    }
}
