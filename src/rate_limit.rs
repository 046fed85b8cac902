//! Token-bucket rate limiter shared by every client in the process.
//!
//! The bucket starts full with `capacity` tokens and refills continuously at
//! `capacity / window` tokens per second, so at most `capacity` requests go
//! out at once and the steady state stays under `capacity` per window.
//! Refill is lazy: it is computed from the elapsed time whenever the bucket
//! is touched.
//!
//! Time comes from [`tokio::time::Instant`], so tests can drive the limiter
//! with a paused clock.

use crate::error::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Requests allowed per refill window by default.
pub const DEFAULT_CAPACITY: u32 = 10;
/// Time for an empty bucket to fill back up by default.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Longest single sleep while waiting, so timeouts are noticed promptly.
const MAX_SLEEP: Duration = Duration::from_secs(1);
/// Shortest sleep, so float rounding can never spin the loop without time passing.
const MIN_SLEEP: Duration = Duration::from_millis(1);
/// Slack for float accumulation when comparing balances.
const EPSILON: f64 = 1e-9;

static SHARED: OnceLock<Arc<RateLimiter>> = OnceLock::new();

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter guarding calls to the generative API.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    /// Tokens per second.
    refill_rate: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Creates a full bucket of `capacity` tokens that refills completely over `window`.
    ///
    /// # Panics
    /// Panics if `capacity` is zero or `window` is zero; both describe a
    /// limiter that can never admit anything.
    pub fn new(capacity: u32, window: Duration) -> Self {
        assert!(capacity > 0, "rate limiter capacity must be positive");
        assert!(!window.is_zero(), "rate limiter window must be positive");

        let capacity = f64::from(capacity);
        Self {
            capacity,
            refill_rate: capacity / window.as_secs_f64(),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// `capacity` requests per minute.
    pub fn per_minute(capacity: u32) -> Self {
        Self::new(capacity, Duration::from_secs(60))
    }

    /// The process-wide limiter (10 requests per minute).
    ///
    /// Created on first use; every later call, from any thread, returns the
    /// same instance.
    pub fn shared() -> Arc<RateLimiter> {
        SHARED
            .get_or_init(|| Arc::new(RateLimiter::default()))
            .clone()
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Tokens added per second.
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Current balance after refilling.
    pub fn available(&self) -> f64 {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        bucket.tokens
    }

    /// Takes `tokens` from the bucket, waiting for refill when necessary.
    ///
    /// Returns `false` if `timeout` elapses first; nothing is deducted in that
    /// case. With no timeout the call waits as long as it takes. A request
    /// larger than the capacity can never be met and is refused at once.
    pub async fn consume(&self, tokens: u32, timeout: Option<Duration>) -> bool {
        let needed = f64::from(tokens);
        if needed > self.capacity {
            warn!(
                requested = tokens,
                capacity = self.capacity,
                "Refusing token request larger than bucket capacity"
            );
            return false;
        }

        let start = Instant::now();
        loop {
            let wait = match self.try_consume(needed) {
                Ok(()) => return true,
                Err(wait) => wait,
            };

            if let Some(limit) = timeout {
                if start.elapsed() > limit {
                    debug!(?limit, "Timed out waiting for rate limit token");
                    return false;
                }
            }

            let nap = wait.clamp(MIN_SLEEP, MAX_SLEEP);
            debug!(?wait, ?nap, "Rate limit reached, waiting for refill");
            tokio::time::sleep(nap).await;
        }
    }

    /// Takes one token, failing with [`Error::RateLimitTimeout`] after `timeout`.
    pub async fn acquire(&self, timeout: Duration) -> Result<()> {
        if self.consume(1, Some(timeout)).await {
            Ok(())
        } else {
            Err(Error::RateLimitTimeout(timeout))
        }
    }

    /// One refill-check-deduct step under the lock.
    ///
    /// Returns the time until enough tokens will have accrued on failure.
    fn try_consume(&self, needed: f64) -> std::result::Result<(), Duration> {
        let mut bucket = self.lock();
        self.refill(&mut bucket);

        if bucket.tokens + EPSILON >= needed {
            bucket.tokens = (bucket.tokens - needed).max(0.0);
            return Ok(());
        }

        let missing = needed - bucket.tokens;
        Err(Duration::try_from_secs_f64(missing / self.refill_rate).unwrap_or(MAX_SLEEP))
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let refilled = bucket.tokens + elapsed.as_secs_f64() * self.refill_rate;
        bucket.tokens = refilled.min(self.capacity);
        bucket.last_refill = now;
    }

    fn lock(&self) -> MutexGuard<'_, Bucket> {
        // The bucket is two plain numbers; a panic elsewhere cannot leave it inconsistent.
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }
}
