//! Pacing properties of the per-domain cooldown, driven by a virtual clock
use funpay_harvester_lib::infrastructure::rate_limiter::{
    Clock, CooldownManager, CooldownPolicy, FastrandJitter, FixedJitter, ManualClock,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

type ManualLimiter = CooldownManager<Arc<ManualClock>, FixedJitter>;

fn manager(policy: CooldownPolicy, clock: &Arc<ManualClock>) -> ManualLimiter {
    CooldownManager::new(policy, Arc::clone(clock), FixedJitter::lower())
}

proptest! {
    #[test]
    fn consecutive_releases_are_at_least_one_interval_apart(
        interval_ms in 1u64..10_000,
        ttl_extra_ms in 1u64..60_000,
        gaps_ms in prop::collection::vec(0u64..20_000, 1..20),
    ) {
        let interval = Duration::from_millis(interval_ms);
        let policy = CooldownPolicy::fixed(interval)
            .with_cache_ttl(interval + Duration::from_millis(ttl_extra_ms));
        let clock = Arc::new(ManualClock::new());
        let limiter = manager(policy, &clock);

        tokio_test::block_on(limiter.cooldown("funpay.com"));
        let mut previous = limiter.last_request("funpay.com").unwrap();

        for gap in gaps_ms {
            clock.advance(Duration::from_millis(gap));
            let before = clock.now();
            let waited = tokio_test::block_on(limiter.cooldown("funpay.com"));
            let release = limiter.last_request("funpay.com").unwrap();

            prop_assert!(release.duration_since(previous) >= interval);
            prop_assert_eq!(release, before + waited);
            prop_assert!(waited <= interval);
            previous = release;
        }
    }

    #[test]
    fn random_interval_stays_within_bounds(seed in any::<u64>(), calls in 2usize..15) {
        let (min, max) = (Duration::from_secs(5), Duration::from_secs(15));
        let policy = CooldownPolicy::default();
        let clock = Arc::new(ManualClock::new());
        let jitter = FastrandJitter::with_seed(seed);
        let limiter = CooldownManager::new(policy, Arc::clone(&clock), jitter);

        let mut previous = None;
        for _ in 0..calls {
            tokio_test::block_on(limiter.cooldown("funpay.com"));
            let release = limiter.last_request("funpay.com").unwrap();
            if let Some(previous) = previous {
                let spacing = release.duration_since(previous);
                prop_assert!(spacing >= min && spacing <= max, "spacing {:?}", spacing);
            }
            previous = Some(release);
        }
    }

    #[test]
    fn entries_older_than_ttl_are_evicted(ttl_secs in 1u64..120, overshoot_ms in 1u64..10_000) {
        let ttl = Duration::from_secs(ttl_secs);
        let policy = CooldownPolicy::fixed(Duration::from_secs(1)).with_cache_ttl(ttl);
        let clock = Arc::new(ManualClock::new());
        let limiter = manager(policy, &clock);

        tokio_test::block_on(limiter.cooldown("a.example"));
        clock.advance(ttl + Duration::from_millis(overshoot_ms));
        tokio_test::block_on(limiter.cooldown("b.example"));

        prop_assert_eq!(limiter.tracked_domains(), vec!["b.example".to_string()]);
    }
}

#[test]
fn evicted_domain_is_served_immediately() {
    let clock = Arc::new(ManualClock::new());
    let policy =
        CooldownPolicy::fixed(Duration::from_secs(60)).with_cache_ttl(Duration::from_secs(30));
    let limiter = manager(policy, &clock);

    tokio_test::block_on(limiter.cooldown("funpay.com"));
    clock.advance(Duration::from_secs(31));

    assert_eq!(tokio_test::block_on(limiter.cooldown("funpay.com")), Duration::ZERO);
    assert!(clock.sleeps().is_empty());
}
