//! Access-token cache with an injected clock.

use chrono::{DateTime, Utc};
use muv_seo_core::Clock;
use std::time::Duration;

/// Tokens are treated as expired this long before their real expiry.
pub const DEFAULT_EXPIRY_SKEW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Holds at most one token; expiry is judged against `clock`.
#[derive(Debug)]
pub struct TokenCache<C: Clock> {
    clock: C,
    skew: chrono::Duration,
    entry: Option<CachedToken>,
}

impl<C: Clock> TokenCache<C> {
    pub fn new(clock: C) -> Self {
        Self::with_skew(clock, DEFAULT_EXPIRY_SKEW)
    }

    pub fn with_skew(clock: C, skew: Duration) -> Self {
        Self {
            clock,
            skew: chrono::Duration::from_std(skew).unwrap_or(chrono::Duration::zero()),
            entry: None,
        }
    }

    /// The cached token, if it is still valid (with skew) at `clock.now()`.
    pub fn get(&self) -> Option<&str> {
        let entry = self.entry.as_ref()?;
        if self.clock.now() < entry.expires_at - self.skew {
            Some(entry.value.as_str())
        } else {
            None
        }
    }

    /// Store a token that lives for `ttl` from now.
    pub fn store(&mut self, value: impl Into<String>, ttl: Duration) -> &CachedToken {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        self.entry.insert(CachedToken {
            value: value.into(),
            expires_at: self.clock.now() + ttl,
        })
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn entry(&self) -> Option<&CachedToken> {
        self.entry.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    /// Clock that tests can advance.
    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

    impl ManualClock {
        fn at(t: DateTime<Utc>) -> Self {
            Self(Arc::new(Mutex::new(t)))
        }

        fn advance(&self, secs: i64) {
            let mut now = self.0.lock().unwrap();
            *now += chrono::Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_cache_has_no_token() {
        let cache = TokenCache::new(ManualClock::at(start()));
        assert_eq!(cache.get(), None);
        assert!(cache.entry().is_none());
    }

    #[test]
    fn test_token_valid_until_skewed_expiry() {
        let clock = ManualClock::at(start());
        let mut cache = TokenCache::new(clock.clone());
        let stored = cache.store("ya29.token", Duration::from_secs(3600));
        assert_eq!(stored.expires_at, start() + chrono::Duration::hours(1));

        assert_eq!(cache.get(), Some("ya29.token"));

        clock.advance(3600 - 61);
        assert_eq!(cache.get(), Some("ya29.token"));

        // inside the 60 s skew
        clock.advance(1);
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_zero_skew_expires_exactly_at_deadline() {
        let clock = ManualClock::at(start());
        let mut cache = TokenCache::with_skew(clock.clone(), Duration::ZERO);
        cache.store("t", Duration::from_secs(10));
        clock.advance(9);
        assert_eq!(cache.get(), Some("t"));
        clock.advance(1);
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_store_replaces_and_clear_empties() {
        let clock = ManualClock::at(start());
        let mut cache = TokenCache::new(clock);
        cache.store("old", Duration::from_secs(3600));
        cache.store("new", Duration::from_secs(3600));
        assert_eq!(cache.get(), Some("new"));
        cache.clear();
        assert_eq!(cache.get(), None);
    }
}
