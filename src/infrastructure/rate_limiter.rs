//! Per-domain request pacing
//!
//! [`CooldownManager`] remembers when each domain was last released and
//! suspends the caller until the configured (or randomly drawn) interval
//! has passed. Time and randomness are injected through [`Clock`] and
//! [`Jitter`] so the pacing can be driven deterministically in tests.
//!
//! The manager is safe to share, but pacing is only guaranteed for one
//! logical caller issuing requests to a domain sequentially. Two tasks
//! calling `cooldown` for the same domain at the same moment each see the
//! other's schedule only after it was written.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Monotonic time source
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Tokio timer backed clock, honours `tokio::time::pause`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: `sleep` returns immediately after advancing time
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    /// Virtual time elapsed since construction
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every duration passed to `sleep`, in call order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}

/// Source of random delays within a range
pub trait Jitter: Send + Sync {
    fn between(&self, min: Duration, max: Duration) -> Duration;
}

/// Uniformly distributed delays from a `fastrand` generator
#[derive(Debug)]
pub struct FastrandJitter {
    rng: Mutex<fastrand::Rng>,
}

impl FastrandJitter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for FastrandJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for FastrandJitter {
    fn between(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let span = u64::try_from((max - min).as_nanos()).unwrap_or(u64::MAX);
        let offset = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .u64(0..=span);
        min + Duration::from_nanos(offset)
    }
}

/// Always picks the same relative point of the range (0.0 = min, 1.0 = max)
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter {
    fraction: f64,
}

impl FixedJitter {
    #[must_use]
    pub fn at(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn lower() -> Self {
        Self::at(0.0)
    }

    #[must_use]
    pub fn upper() -> Self {
        Self::at(1.0)
    }
}

impl Jitter for FixedJitter {
    fn between(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        min + (max - min).mul_f64(self.fraction)
    }
}

/// Pacing rules shared by every domain of one manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// Fixed interval; when `None` or zero a fresh random interval is drawn per request
    pub min_interval: Option<Duration>,
    pub random_interval: (Duration, Duration),
    /// Inactivity after which a domain entry is forgotten
    pub cache_ttl: Duration,
}

impl CooldownPolicy {
    pub const DEFAULT_RANDOM_INTERVAL: (Duration, Duration) =
        (Duration::from_secs(5), Duration::from_secs(15));
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

    #[must_use]
    pub const fn fixed(interval: Duration) -> Self {
        Self {
            min_interval: Some(interval),
            random_interval: Self::DEFAULT_RANDOM_INTERVAL,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
        }
    }

    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            min_interval: None,
            random_interval: Self::DEFAULT_RANDOM_INTERVAL,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
        }
    }
}

/// Tracks the scheduled release instant of the last request per domain
pub struct CooldownManager<C = TokioClock, J = FastrandJitter> {
    policy: CooldownPolicy,
    clock: C,
    jitter: J,
    releases: Mutex<HashMap<String, Instant>>,
}

impl CooldownManager {
    /// Manager on the tokio timer with `fastrand` jitter
    #[must_use]
    pub fn with_policy(policy: CooldownPolicy) -> Self {
        Self::new(policy, TokioClock, FastrandJitter::new())
    }
}

impl<C: Clock, J: Jitter> CooldownManager<C, J> {
    pub fn new(policy: CooldownPolicy, clock: C, jitter: J) -> Self {
        Self {
            policy,
            clock,
            jitter,
            releases: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &CooldownPolicy {
        &self.policy
    }

    /// Suspends until a request to `domain` may be issued, returning the wait.
    ///
    /// Stale entries of every domain are purged first. The release instant is
    /// stored before suspending, so a caller abandoned mid-wait still leaves
    /// the next request paced from that instant.
    pub async fn cooldown(&self, domain: &str) -> Duration {
        let now = self.clock.now();

        let wait = {
            let mut releases = self.lock_releases();
            self.evict_stale(&mut releases, now);

            let wait = releases.get(domain).map_or(Duration::ZERO, |last| {
                let ready_at = *last + self.next_interval();
                ready_at.saturating_duration_since(now)
            });
            releases.insert(domain.to_string(), now + wait);
            wait
        };

        if wait.is_zero() {
            trace!(domain, "no cooldown needed");
        } else {
            debug!(domain, wait_ms = wait.as_millis(), "cooling down before request");
            self.clock.sleep(wait).await;
        }

        wait
    }

    /// Short random pause through the same clock, outside any domain schedule
    pub async fn pause_between(&self, min: Duration, max: Duration) -> Duration {
        let pause = self.jitter.between(min, max);
        debug!(pause_ms = pause.as_millis(), "pausing");
        self.clock.sleep(pause).await;
        pause
    }

    /// Release instant recorded for `domain`, if it is still tracked
    #[must_use]
    pub fn last_request(&self, domain: &str) -> Option<Instant> {
        self.lock_releases().get(domain).copied()
    }

    /// Tracked domains in sorted order
    #[must_use]
    pub fn tracked_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.lock_releases().keys().cloned().collect();
        domains.sort();
        domains
    }

    fn next_interval(&self) -> Duration {
        self.policy.min_interval.filter(|interval| !interval.is_zero()).unwrap_or_else(|| {
            let (min, max) = self.policy.random_interval;
            self.jitter.between(min, max)
        })
    }

    fn evict_stale(&self, releases: &mut HashMap<String, Instant>, now: Instant) {
        let ttl = self.policy.cache_ttl;
        releases.retain(|domain, last| {
            let keep = now.saturating_duration_since(*last) <= ttl;
            if !keep {
                trace!(domain = domain.as_str(), "evicting stale cooldown entry");
            }
            keep
        });
    }

    fn lock_releases(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.releases.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
