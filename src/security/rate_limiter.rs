use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    pub enabled: bool,
    pub window: Duration,
    pub max_requests: u32,
    pub max_keys: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::from_secs(15 * 60),
            max_requests: 50,
            max_keys: 10_000,
        }
    }
}

#[derive(Clone, Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Per-key fixed-window counter with LRU-bounded state
pub struct RateLimiter {
    config: RateLimiterConfig,
    windows: Mutex<LruCache<String, Window>>, // keyed by client IP string
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterState {
    pub enabled: bool,
    pub window_secs: u64,
    pub max_requests: u32,
    pub active_keys: usize,
    pub capacity: usize,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_keys.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            windows: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn snapshot(&self) -> RateLimiterState {
        let guard = self.windows.lock();
        RateLimiterState {
            enabled: self.config.enabled,
            window_secs: self.config.window.as_secs(),
            max_requests: self.config.max_requests,
            active_keys: guard.len(),
            capacity: self.config.max_keys,
        }
    }

    /// Count a request for `key`; returns (allow, retry_after_secs)
    pub fn check_key(&self, key: &str) -> (bool, u64) {
        self.check_key_at(key, Instant::now())
    }

    pub fn check_key_at(&self, key: &str, now: Instant) -> (bool, u64) {
        if !self.config.enabled {
            return (true, 0);
        }
        if self.config.max_requests == 0 {
            return (false, self.config.window.as_secs().max(1));
        }

        let mut map = self.windows.lock();

        if let Some(window) = map.get_mut(key) {
            if now < window.reset_at {
                if window.count >= self.config.max_requests {
                    let remaining = window.reset_at.duration_since(now);
                    return (false, ceil_secs(remaining));
                }
                window.count += 1;
                return (true, 0);
            }
        }

        // First request from this key, or its window has expired
        map.put(
            key.to_string(),
            Window {
                count: 1,
                reset_at: now + self.config.window,
            },
        );
        (true, 0)
    }

    /// Drop entries whose window has already expired; returns how many went.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut map = self.windows.lock();
        let expired: Vec<String> = map
            .iter()
            .filter(|(_, w)| now >= w.reset_at)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            map.pop(key);
        }
        expired.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64, max_keys: usize) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            enabled: true,
            window: Duration::from_secs(window_secs),
            max_requests,
            max_keys,
        })
    }

    #[test]
    fn test_51st_request_in_window_is_rejected() {
        let rl = limiter(50, 900, 100);
        let start = Instant::now();
        for i in 0..50 {
            let (ok, _) = rl.check_key_at("1.2.3.4", start + Duration::from_secs(i));
            assert!(ok, "request {} should pass", i + 1);
        }
        let (ok, retry) = rl.check_key_at("1.2.3.4", start + Duration::from_secs(60));
        assert!(!ok);
        assert_eq!(retry, 840);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let rl = limiter(2, 10, 100);
        let t0 = Instant::now();
        assert!(rl.check_key_at("k", t0).0);
        assert!(rl.check_key_at("k", t0).0);
        assert!(!rl.check_key_at("k", t0 + Duration::from_secs(9)).0);
        // Expired: count restarts at 1
        assert!(rl.check_key_at("k", t0 + Duration::from_secs(10)).0);
        assert!(rl.check_key_at("k", t0 + Duration::from_secs(11)).0);
        assert!(!rl.check_key_at("k", t0 + Duration::from_secs(12)).0);
    }

    #[test]
    fn test_keys_are_independent() {
        let rl = limiter(1, 60, 100);
        let now = Instant::now();
        assert!(rl.check_key_at("a", now).0);
        assert!(!rl.check_key_at("a", now).0);
        assert!(rl.check_key_at("b", now).0);
    }

    #[test]
    fn test_disabled_always_allows() {
        let rl = RateLimiter::new(RateLimiterConfig {
            enabled: false,
            max_requests: 0,
            ..RateLimiterConfig::default()
        });
        for _ in 0..100 {
            assert_eq!(rl.check_key("x"), (true, 0));
        }
    }

    #[test]
    fn test_lru_bounds_tracked_keys() {
        let rl = limiter(1, 60, 2);
        let now = Instant::now();
        rl.check_key_at("a", now);
        rl.check_key_at("b", now);
        rl.check_key_at("c", now);
        assert_eq!(rl.snapshot().active_keys, 2);
        // "a" was evicted, so it starts a fresh window
        assert!(rl.check_key_at("a", now).0);
    }

    #[test]
    fn test_sweep_expired() {
        let rl = limiter(5, 10, 100);
        let t0 = Instant::now();
        rl.check_key_at("old", t0);
        rl.check_key_at("new", t0 + Duration::from_secs(8));
        assert_eq!(rl.sweep_expired_at(t0 + Duration::from_secs(12)), 1);
        let state = rl.snapshot();
        assert_eq!(state.active_keys, 1);
        assert_eq!(state.window_secs, 10);
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ceil_secs(Duration::from_secs(3)), 3);
    }
}
