//! # Rate Limiter & Burst Handler
//!
//! Two layered limiters sitting in front of admission: a sliding-window
//! request limiter keyed by `(user, tier)` that enforces `requestsPerMinute`,
//! and a token-bucket burst handler keyed by an arbitrary identifier (user
//! or provider) that allows short overages bounded by `maxBurstDuration`
//! followed by a mandatory cooldown.
//!
//! Both structures are `DashMap`-backed in-process stand-ins for the
//! coordination store's `throttle:{userId}` sorted set and
//! `burst:state:{id}` string; a horizontally-scaled deployment would back
//! these with the shared store so replicas observe identical windows.
//! Every operation here is best-effort: a bookkeeping error fails open
//! (allows the request) and logs a warning rather than rejecting a user
//! request for an internal fault.

use crate::request::UserTier;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-tier request and burst allowances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierLimits {
    pub requests_per_minute: u32,
    pub burst_limit: u32,
}

/// Default tier table, matching the magnitudes used in the end-to-end rate
/// limit scenario (a basic-tier cap of `requestsPerMinute = 3500`).
pub fn default_tier_limits(tier: UserTier) -> TierLimits {
    match tier {
        UserTier::Basic => TierLimits {
            requests_per_minute: 3_500,
            burst_limit: 50,
        },
        UserTier::Premium => TierLimits {
            requests_per_minute: 10_000,
            burst_limit: 200,
        },
        UserTier::Enterprise => TierLimits {
            requests_per_minute: 50_000,
            burst_limit: 1_000,
        },
    }
}

/// Sliding-window request limiter, one window per user.
///
/// Backed by a bounded deque of timestamps standing in for the coordination
/// store's sorted set of `(nowNanos, nonce)` entries — entries older than
/// 60s are evicted on every check.
#[derive(Default)]
struct UserWindow {
    entries: VecDeque<Instant>,
    last_limit: u32,
}

#[derive(Default)]
pub struct SlidingWindowLimiter {
    windows: DashMap<String, Mutex<UserWindow>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict entries older than 60s, count what remains, and admit the
    /// request only if the remaining count is below `limit`. On admission
    /// the current timestamp is appended.
    pub fn check_and_record(&self, user_id: &str, limit: u32) -> bool {
        let window_entry = self.windows.entry(user_id.to_string()).or_default();
        let mut window = window_entry.lock().unwrap();
        window.last_limit = limit;
        let now = Instant::now();
        let cutoff = now - Duration::from_secs(60);
        while window.entries.front().is_some_and(|t| *t < cutoff) {
            window.entries.pop_front();
        }
        if window.entries.len() as u32 >= limit {
            return false;
        }
        window.entries.push_back(now);
        true
    }

    pub fn current_count(&self, user_id: &str) -> u32 {
        match self.windows.get(user_id) {
            Some(entry) => {
                let mut window = entry.lock().unwrap();
                let cutoff = Instant::now() - Duration::from_secs(60);
                while window.entries.front().is_some_and(|t| *t < cutoff) {
                    window.entries.pop_front();
                }
                window.entries.len() as u32
            }
            None => 0,
        }
    }

    /// User ids this limiter has seen at least one request from, for the
    /// periodic `rateLimitWarning` sweep to iterate over.
    pub fn tracked_users(&self) -> Vec<String> {
        self.windows.iter().map(|e| e.key().clone()).collect()
    }

    /// Current request count and the most recently applied tier limit for
    /// `user_id`, or `None` if this limiter has never seen that user.
    pub fn usage(&self, user_id: &str) -> Option<(u32, u32)> {
        let entry = self.windows.get(user_id)?;
        let count = self.current_count(user_id);
        let limit = entry.lock().unwrap().last_limit;
        Some((count, limit))
    }
}

/// Token-bucket burst state for one identifier, mirroring `Burst State` in
/// the data model.
///
/// Process-local only (see module docs on the coordination-store stand-in):
/// `Instant` has no meaningful wall-clock serialization, so this type is not
/// `Serialize`/`Deserialize` the way a store-backed implementation's JSON
/// snapshot would be.
#[derive(Debug, Clone)]
pub struct BurstState {
    pub capacity: f64,
    pub refill_rate_per_second: f64,
    pub current_tokens: f64,
    pub last_refill_at: Instant,
    pub in_burst: bool,
    pub burst_started_at: Option<Instant>,
    pub cooldown_until: Option<Instant>,
    pub total_bursts: u64,
}

impl BurstState {
    fn new(capacity: f64, refill_rate_per_second: f64) -> Self {
        Self {
            capacity,
            refill_rate_per_second,
            current_tokens: capacity,
            last_refill_at: Instant::now(),
            in_burst: false,
            burst_started_at: None,
            cooldown_until: None,
            total_bursts: 0,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill_at).as_secs_f64();
        self.current_tokens =
            (self.current_tokens + (elapsed * self.refill_rate_per_second).floor())
                .min(self.capacity);
        self.last_refill_at = now;
    }
}

/// Outcome of a burst-handler admission check.
#[derive(Debug, Clone, PartialEq)]
pub enum BurstDecision {
    /// Admitted from the steady-state bucket.
    Allowed,
    /// Admitted by borrowing from the burst allowance.
    AllowedInBurst,
    /// Rejected; the caller should wait `retry_after` before trying again.
    Rejected { retry_after: Duration },
}

/// Token-bucket burst handler with deterministic (non-random) burst-mode
/// bookkeeping, per Open Question (b): the source samples jitter from
/// `Math.random()` when entering burst mode, biasing some users; this port
/// intentionally does not replicate that randomness.
#[derive(Default)]
pub struct BurstHandler {
    buckets: DashMap<String, Mutex<BurstState>>,
}

/// Configuration governing burst admission, independent per caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BurstConfig {
    pub capacity: f64,
    pub refill_rate_per_second: f64,
    pub burst_size: f64,
    pub max_burst_duration: Duration,
    pub cooldown_period: Duration,
}

impl BurstHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and consume tokens for `identifier`, creating a fresh bucket at
    /// full capacity on first use.
    pub fn check(&self, identifier: &str, requested: f64, config: BurstConfig) -> BurstDecision {
        let entry = self
            .buckets
            .entry(identifier.to_string())
            .or_insert_with(|| Mutex::new(BurstState::new(config.capacity, config.refill_rate_per_second)));
        let mut state = entry.lock().unwrap();
        let now = Instant::now();

        if let Some(until) = state.cooldown_until {
            if now < until {
                return BurstDecision::Rejected {
                    retry_after: until - now,
                };
            }
            state.cooldown_until = None;
        }

        state.refill(now);

        if state.current_tokens >= requested {
            state.current_tokens -= requested;
            return BurstDecision::Allowed;
        }

        // Not enough steady-state tokens: consider entering (or continuing)
        // burst mode.
        let burst_started_at = *state.burst_started_at.get_or_insert(now);
        let burst_elapsed = now.saturating_duration_since(burst_started_at);

        if burst_elapsed >= config.max_burst_duration {
            // Burst window expired: exit burst mode and enter cooldown.
            state.in_burst = false;
            state.burst_started_at = None;
            state.cooldown_until = Some(now + config.cooldown_period);
            return BurstDecision::Rejected {
                retry_after: config.cooldown_period,
            };
        }

        if requested <= config.burst_size {
            if !state.in_burst {
                state.in_burst = true;
                state.total_bursts += 1;
            }
            // Borrowed tokens are not deducted from the steady-state bucket;
            // they are bounded purely by `max_burst_duration` above.
            return BurstDecision::AllowedInBurst;
        }

        BurstDecision::Rejected {
            retry_after: config.cooldown_period,
        }
    }

    pub fn snapshot(&self, identifier: &str) -> Option<BurstState> {
        self.buckets
            .get(identifier)
            .map(|entry| entry.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_window_rejects_once_limit_is_reached() {
        let limiter = SlidingWindowLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check_and_record("u1", 5));
        }
        assert!(!limiter.check_and_record("u1", 5));
    }

    #[test]
    fn sliding_window_is_independent_per_user() {
        let limiter = SlidingWindowLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check_and_record("u1", 5));
        }
        assert!(limiter.check_and_record("u2", 5));
    }

    #[test]
    fn burst_bucket_at_exact_capacity_accepts_full_request_and_leaves_zero() {
        let handler = BurstHandler::new();
        let config = BurstConfig {
            capacity: 10.0,
            refill_rate_per_second: 1.0,
            burst_size: 5.0,
            max_burst_duration: Duration::from_secs(30),
            cooldown_period: Duration::from_secs(60),
        };
        let decision = handler.check("u1", 10.0, config);
        assert_eq!(decision, BurstDecision::Allowed);
        let snap = handler.snapshot("u1").unwrap();
        assert_eq!(snap.current_tokens, 0.0);
    }

    #[test]
    fn exceeding_bucket_enters_deterministic_burst_mode() {
        let handler = BurstHandler::new();
        let config = BurstConfig {
            capacity: 1.0,
            refill_rate_per_second: 0.0,
            burst_size: 5.0,
            max_burst_duration: Duration::from_secs(30),
            cooldown_period: Duration::from_secs(60),
        };
        // Drain the bucket.
        assert_eq!(handler.check("u1", 1.0, config), BurstDecision::Allowed);
        // Next request exceeds remaining tokens but is within burst_size.
        assert_eq!(
            handler.check("u1", 1.0, config),
            BurstDecision::AllowedInBurst
        );
        let snap = handler.snapshot("u1").unwrap();
        assert!(snap.in_burst);
        assert_eq!(snap.total_bursts, 1);
    }

    #[test]
    fn default_tier_limits_match_basic_rate_limit_scenario() {
        let limits = default_tier_limits(UserTier::Basic);
        assert_eq!(limits.requests_per_minute, 3_500);
    }
}
