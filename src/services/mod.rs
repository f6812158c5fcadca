// Service exports
pub mod cache;
pub mod clock;
pub mod postgres;
pub mod rate_limit;
pub mod security;
pub mod store;

pub use cache::{BoundedCache, CacheEntry, CacheKey};
pub use clock::{Clock, ManualClock, SystemClock};
pub use postgres::PostgresStore;
pub use rate_limit::{RateLimiter, RateWindow};
pub use security::{CipherError, TokenCipher};
pub use store::{InMemoryStore, Store, StoreError};
