//! Rate Limiting Infrastructure
//!
//! Failed-attempt counting with temporary lockout, keyed by an arbitrary
//! string (login identifier, client address, ...).
//!
//! An attempt is counted when it starts, not when it fails. The lock check,
//! the increment and the threshold check happen in one critical section, so
//! no more than `max_attempts` attempts can be in flight or done for a key
//! before it locks, however many arrive at once. An attempt that succeeds
//! clears the key; one that never reached a verdict is handed back with
//! [`RateLimitStore::release`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Failures allowed before the key is locked
    pub max_attempts: u32,
    /// How long a lock lasts
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// End of a lock engaged at `now`, saturating at the latest representable
    /// instant
    pub fn lock_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_milliseconds(self.window_ms())
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Outcome of counting an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Attempts counted for the key, this one included
    pub attempts: u32,
    /// Attempts left before the lock engages
    pub remaining: u32,
    /// Set when this attempt engaged the lock
    pub locked_until: Option<DateTime<Utc>>,
}

impl RateLimitResult {
    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some()
    }
}

/// Storage backend for attempt counters
///
/// Implementations must make [`RateLimitStore::acquire`] atomic per key.
pub trait RateLimitStore: Send + Sync {
    /// Lock expiry for `key` if it is locked at `now`
    ///
    /// An elapsed lock is cleared together with its counter.
    fn locked_until(&self, key: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>>;

    /// Count an attempt before it runs and engage the lock once the threshold
    /// is reached
    ///
    /// `Err` carries the lock expiry when `key` is already locked; nothing is
    /// counted then.
    fn acquire(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitResult, DateTime<Utc>>;

    /// Hand back an attempt counted by [`RateLimitStore::acquire`] that never
    /// reached a verdict
    ///
    /// Lifts the lock if the attempt was the one that engaged it.
    fn release(&self, key: &str);

    /// Current failure count for `key`
    fn attempts(&self, key: &str) -> u32;

    /// Forget everything about `key`
    fn clear(&self, key: &str);
}

#[derive(Debug, Clone, Default)]
struct AttemptRecord {
    attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// In-process [`RateLimitStore`]
///
/// One instance per guard by default, so independent guards never share
/// counters; share an `Arc<LoginThrottle>` to throttle across requests.
#[derive(Debug)]
pub struct LoginThrottle {
    config: RateLimitConfig,
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl LoginThrottle {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, AttemptRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimitStore for LoginThrottle {
    fn locked_until(&self, key: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut records = self.records();
        let until = records.get(key).and_then(|r| r.locked_until)?;
        if now < until {
            Some(until)
        } else {
            records.remove(key);
            None
        }
    }

    fn acquire(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitResult, DateTime<Utc>> {
        let mut records = self.records();
        let record = records.entry(key.to_string()).or_default();

        match record.locked_until {
            Some(until) if now < until => return Err(until),
            // A lock that already ran out starts a fresh series
            Some(_) => *record = AttemptRecord::default(),
            None => {}
        }

        record.attempts = record.attempts.saturating_add(1);
        if record.attempts >= self.config.max_attempts {
            record.locked_until = Some(self.config.lock_expiry(now));
        }

        Ok(RateLimitResult {
            attempts: record.attempts,
            remaining: self.config.max_attempts.saturating_sub(record.attempts),
            locked_until: record.locked_until,
        })
    }

    fn release(&self, key: &str) {
        let mut records = self.records();
        let Some(record) = records.get_mut(key) else {
            return;
        };
        record.attempts = record.attempts.saturating_sub(1);
        if record.attempts < self.config.max_attempts {
            record.locked_until = None;
        }
        if record.attempts == 0 {
            records.remove(key);
        }
    }

    fn attempts(&self, key: &str) -> u32 {
        self.records().get(key).map_or(0, |r| r.attempts)
    }

    fn clear(&self, key: &str) {
        self.records().remove(key);
    }
}
