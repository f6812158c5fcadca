use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::services::clock::{Clock, SystemClock};

/// Upper bound on a TTL, one hundred years
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Value stored with its absolute expiry
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: DateTime<Utc>,
}

/// Time-expiring key/value cache for upstream lookups
///
/// Backed by a concurrent moka cache so each key is read and written
/// atomically. Expiry is decided against the injected [`Clock`]: a read past
/// `expires_at` evicts the entry and reports a miss. There is no size bound.
pub struct BoundedCache<V> {
    entries: moka::future::Cache<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V> BoundedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache on the wall clock
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_clock(ttl_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let ttl_secs = ttl_secs.min(MAX_TTL_SECS) as i64;
        Self {
            entries: moka::future::Cache::builder().build(),
            ttl: Duration::seconds(ttl_secs),
            clock,
        }
    }

    /// Get a live value, evicting it if it has expired
    pub async fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key).await?;

        if self.clock.now() > entry.expires_at {
            self.entries.invalidate(key).await;
            tracing::trace!(key = %key, "Cache entry expired");
            return None;
        }

        tracing::trace!(key = %key, "Cache hit");
        Some(entry.value)
    }

    /// Store a value until `now + ttl`
    pub async fn set(&self, key: &str, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now() + self.ttl,
        };
        self.entries.insert(key.to_string(), entry).await;
        tracing::trace!(key = %key, "Cache set");
    }

    /// Whether the key currently occupies storage, expired or not
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for the events of a team within a date window
    pub fn games(team: &str, date_start: DateTime<Utc>, date_end: DateTime<Utc>) -> String {
        format!("games:{}:{}:{}", team, date_start.to_rfc3339(), date_end.to_rfc3339())
    }

    /// Key for a ticket quote; band bounds are rounded to cents
    pub fn ticket(event_id: &str, party_size: u32, band_low: f64, band_high: f64) -> String {
        format!("ticket:{}:{}:{:.2}:{:.2}", event_id, party_size, band_low, band_high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use chrono::TimeZone;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_cache_set_get_before_ttl() {
        let clock = clock();
        let cache: BoundedCache<String> = BoundedCache::with_clock(60, Arc::new(clock.clone()));

        cache.set("k", "v".to_string()).await;
        clock.advance(Duration::seconds(60));

        // Exactly at expiry is still live
        assert_eq!(cache.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_cache_expiry_evicts() {
        let clock = clock();
        let cache: BoundedCache<u32> = BoundedCache::with_clock(60, Arc::new(clock.clone()));

        cache.set("k", 7).await;
        clock.advance(Duration::seconds(61));

        assert_eq!(cache.get("k").await, None);
        assert!(!cache.contains_key("k"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_set_overwrites_and_refreshes_expiry() {
        let clock = clock();
        let cache: BoundedCache<u32> = BoundedCache::with_clock(60, Arc::new(clock.clone()));

        cache.set("k", 1).await;
        clock.advance(Duration::seconds(50));
        cache.set("k", 2).await;
        clock.advance(Duration::seconds(50));

        assert_eq!(cache.get("k").await, Some(2));
    }

    #[tokio::test]
    async fn test_cache_miss_for_unknown_key() {
        let cache: BoundedCache<u32> = BoundedCache::new(900);
        assert_eq!(cache.get("missing").await, None);
        assert_eq!(cache.ttl_secs(), 900);
    }

    #[test]
    fn test_cache_key_builder() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(
            CacheKey::games("Yankees", start, end),
            "games:Yankees:2026-05-01T00:00:00+00:00:2026-06-01T00:00:00+00:00"
        );
        assert_eq!(CacheKey::ticket("401", 2, 30.0, 360.0), "ticket:401:2:30.00:360.00");
        assert_eq!(CacheKey::ticket("401", 4, 12.346, 99.999), "ticket:401:4:12.35:100.00");
    }
}
