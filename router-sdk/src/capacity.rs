//! # Capacity Manager
//!
//! Per-provider concurrent-slot accounting and sliding-window request/token
//! counters. This is the admission gate the queue and router consult before
//! a request is ever handed to a provider adapter: `reserve` must succeed
//! (atomically) before a request moves from `Dispatched` to `Admitted`, and
//! `release` must run on every terminal path so the reservation is never
//! leaked.
//!
//! Sliding windows and the capacity snapshot are an in-process stand-in for
//! the coordination-store keys `capacity:{providerId}` and
//! `window:{providerId}:{period}:{bucket}` — a horizontally-scaled
//! deployment would back this with the shared store instead, but the
//! admission semantics are identical either way.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors returned by capacity operations. None of these should ever fail a
/// user request on their own — callers treat `Err` from `release` as a
/// critical inconsistency to log and reconcile on the next sweep, not as a
/// retryable failure.
#[derive(Error, Debug)]
pub enum CapacityError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("capacity already released for provider {0}")]
    DoubleRelease(String),
}

/// The sliding-window granularities tracked per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Minute,
    Hour,
    Day,
}

impl Window {
    fn duration(self) -> Duration {
        match self {
            Window::Minute => Duration::from_secs(60),
            Window::Hour => Duration::from_secs(3600),
            Window::Day => Duration::from_secs(86400),
        }
    }

    fn bucket_start(self, now: SystemTime) -> u64 {
        let secs = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let window_secs = self.duration().as_secs();
        (secs / window_secs) * window_secs
    }
}

#[derive(Debug, Default)]
struct WindowCounter {
    requests: AtomicU64,
    tokens: AtomicU64,
}

/// Declared limits for one provider, matching `Provider.declaredLimits` in
/// the data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityLimits {
    pub max_concurrent: u32,
    pub per_minute_requests: u64,
    pub per_minute_tokens: u64,
    pub per_hour_requests: u64,
    pub per_hour_tokens: u64,
    pub per_day_requests: u64,
    pub per_day_tokens: u64,
    pub queue_length_limit: u32,
    pub overload_protection: f64,
    /// Concurrent-utilization fraction at which `sweep_health` raises a
    /// `warningUtilization` alert.
    pub warning_utilization: f64,
    /// Concurrent-utilization fraction at which `sweep_health` raises a
    /// `criticalUtilization` alert.
    pub critical_utilization: f64,
}

impl Default for CapacityLimits {
    fn default() -> Self {
        Self {
            max_concurrent: 50,
            per_minute_requests: 3_000,
            per_minute_tokens: 1_000_000,
            per_hour_requests: 100_000,
            per_hour_tokens: 20_000_000,
            per_day_requests: 1_000_000,
            per_day_tokens: 200_000_000,
            queue_length_limit: 10_000,
            overload_protection: 0.95,
            warning_utilization: 0.75,
            critical_utilization: 0.90,
        }
    }
}

/// Live capacity accounting for one provider.
struct ProviderCapacity {
    limits: CapacityLimits,
    active: AtomicU64,
    reserved: AtomicU64,
    queue_length: AtomicU64,
    average_processing_time_ms: std::sync::Mutex<f64>,
    health_score: std::sync::Mutex<f64>,
    windows: DashMap<(Window, u64), WindowCounter>,
}

/// A point-in-time snapshot of a provider's capacity state, mirroring
/// `Capacity State` in the data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub provider_id: String,
    pub active_requests: u64,
    pub reserved_requests: u64,
    pub available_slots: i64,
    pub queue_length: u64,
    pub average_processing_time_ms: f64,
    pub health_score: f64,
}

/// Per-provider concurrent slot accounting and sliding-window counters.
///
/// Cheap to clone (`Arc` internally); intended to be constructed once and
/// shared via the services container.
#[derive(Clone, Default)]
pub struct CapacityManager {
    providers: Arc<DashMap<String, ProviderCapacity>>,
}

impl CapacityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a provider's declared limits.
    pub fn register_provider(&self, provider_id: impl Into<String>, limits: CapacityLimits) {
        self.providers.insert(
            provider_id.into(),
            ProviderCapacity {
                limits,
                active: AtomicU64::new(0),
                reserved: AtomicU64::new(0),
                queue_length: AtomicU64::new(0),
                average_processing_time_ms: std::sync::Mutex::new(0.0),
                health_score: std::sync::Mutex::new(1.0),
                windows: DashMap::new(),
            },
        );
    }

    pub fn set_queue_length(&self, provider_id: &str, length: u64) {
        if let Some(p) = self.providers.get(provider_id) {
            p.queue_length.store(length, Ordering::SeqCst);
        }
    }

    /// `hasAvailableCapacity` — returns `false` if concurrent slots are
    /// exhausted, any sliding-window cap would be exceeded by
    /// `estimated_tokens`, the queue is full, health is below 0.5, or
    /// utilization exceeds `overload_protection`.
    pub fn has_available_capacity(
        &self,
        provider_id: &str,
        estimated_tokens: u64,
    ) -> Result<bool, CapacityError> {
        let p = self
            .providers
            .get(provider_id)
            .ok_or_else(|| CapacityError::UnknownProvider(provider_id.to_string()))?;

        let in_flight = p.active.load(Ordering::SeqCst) + p.reserved.load(Ordering::SeqCst);
        if in_flight >= p.limits.max_concurrent as u64 {
            return Ok(false);
        }

        let now = SystemTime::now();
        for (window, req_cap, tok_cap) in [
            (Window::Minute, p.limits.per_minute_requests, p.limits.per_minute_tokens),
            (Window::Hour, p.limits.per_hour_requests, p.limits.per_hour_tokens),
            (Window::Day, p.limits.per_day_requests, p.limits.per_day_tokens),
        ] {
            let (reqs, toks) = self.window_counts(&p, window, now);
            if reqs >= req_cap || toks + estimated_tokens > tok_cap {
                return Ok(false);
            }
        }

        if p.queue_length.load(Ordering::SeqCst) >= p.limits.queue_length_limit as u64 {
            return Ok(false);
        }

        let health = *p.health_score.lock().unwrap();
        if health < 0.5 {
            return Ok(false);
        }

        let utilization = in_flight as f64 / p.limits.max_concurrent.max(1) as f64;
        if utilization > p.limits.overload_protection {
            return Ok(false);
        }

        Ok(true)
    }

    fn window_counts(&self, p: &ProviderCapacity, window: Window, now: SystemTime) -> (u64, u64) {
        let bucket = window.bucket_start(now);
        // Lazily evict buckets older than twice the window length instead of
        // running a background sweep, since process-local state is bounded
        // by the number of distinct recent buckets (at most a handful).
        let ttl = window.duration() * 2;
        p.windows.retain(|(w, start), _| {
            *w != window
                || now
                    .duration_since(UNIX_EPOCH + Duration::from_secs(*start))
                    .map(|age| age < ttl)
                    .unwrap_or(true)
        });
        match p.windows.get(&(window, bucket)) {
            Some(counter) => (
                counter.requests.load(Ordering::SeqCst),
                counter.tokens.load(Ordering::SeqCst),
            ),
            None => (0, 0),
        }
    }

    /// `reserve` — atomic check-and-increment of `activeRequests`. Never
    /// blocks; fails fast by returning `false` when no slot is available.
    pub fn reserve(&self, provider_id: &str) -> Result<bool, CapacityError> {
        let p = self
            .providers
            .get(provider_id)
            .ok_or_else(|| CapacityError::UnknownProvider(provider_id.to_string()))?;

        loop {
            let active = p.active.load(Ordering::SeqCst);
            let reserved = p.reserved.load(Ordering::SeqCst);
            if active + reserved >= p.limits.max_concurrent as u64 {
                return Ok(false);
            }
            if p.reserved
                .compare_exchange(reserved, reserved + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                p.active.fetch_add(1, Ordering::SeqCst);
                p.reserved.fetch_sub(1, Ordering::SeqCst);
                return Ok(true);
            }
        }
    }

    /// `release` — decrement `activeRequests` and fold `processing_time_ms`
    /// into the provider's EWMA (`avg <- 0.9*avg + 0.1*observed`). Must be
    /// called exactly once per successful `reserve`; a provider with no
    /// active requests left logs a double-release rather than underflowing.
    pub fn release(&self, provider_id: &str, processing_time_ms: f64) -> Result<(), CapacityError> {
        let p = self
            .providers
            .get(provider_id)
            .ok_or_else(|| CapacityError::UnknownProvider(provider_id.to_string()))?;

        let prev = p.active.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |a| {
            if a == 0 {
                None
            } else {
                Some(a - 1)
            }
        });
        if prev.is_err() {
            return Err(CapacityError::DoubleRelease(provider_id.to_string()));
        }

        let mut avg = p.average_processing_time_ms.lock().unwrap();
        *avg = 0.9 * *avg + 0.1 * processing_time_ms;
        Ok(())
    }

    /// `recordUsage` — fold observed token usage into the current bucket of
    /// every sliding window. Called once per completed request with the
    /// provider-reported usage (preferred over the request's estimate).
    pub fn record_usage(&self, provider_id: &str, tokens: u64) -> Result<(), CapacityError> {
        let p = self
            .providers
            .get(provider_id)
            .ok_or_else(|| CapacityError::UnknownProvider(provider_id.to_string()))?;

        let now = SystemTime::now();
        for window in [Window::Minute, Window::Hour, Window::Day] {
            let bucket = window.bucket_start(now);
            let counter = p.windows.entry((window, bucket)).or_default();
            counter.requests.fetch_add(1, Ordering::SeqCst);
            counter.tokens.fetch_add(tokens, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Recompute the health score for one provider from current utilization,
    /// per the health-score formula:
    /// `0.4*(1-concurrentUtil) + 0.3*(1-rateUtil) + 0.3*(1-queueUtil)`.
    /// Intended to be called from a periodic sweep task
    /// (`monitoring.updateInterval`) owned by the services container.
    pub fn sweep_health(&self, provider_id: &str) -> Result<f64, CapacityError> {
        let p = self
            .providers
            .get(provider_id)
            .ok_or_else(|| CapacityError::UnknownProvider(provider_id.to_string()))?;

        let in_flight = p.active.load(Ordering::SeqCst) + p.reserved.load(Ordering::SeqCst);
        let concurrent_util = in_flight as f64 / p.limits.max_concurrent.max(1) as f64;

        let (minute_reqs, _) = self.window_counts(&p, Window::Minute, SystemTime::now());
        let rate_util = minute_reqs as f64 / p.limits.per_minute_requests.max(1) as f64;

        let queue_util =
            p.queue_length.load(Ordering::SeqCst) as f64 / p.limits.queue_length_limit.max(1) as f64;

        let score = 0.4 * (1.0 - concurrent_util).max(0.0)
            + 0.3 * (1.0 - rate_util).max(0.0)
            + 0.3 * (1.0 - queue_util).max(0.0);
        let score = score.clamp(0.0, 1.0);

        *p.health_score.lock().unwrap() = score;
        Ok(score)
    }

    /// The declared limits a provider was registered with, for callers
    /// that need the warning/critical utilization thresholds alongside a
    /// snapshot (e.g. the alerting sweep).
    pub fn limits(&self, provider_id: &str) -> Option<CapacityLimits> {
        self.providers.get(provider_id).map(|p| p.limits.clone())
    }

    pub fn snapshot(&self, provider_id: &str) -> Option<CapacitySnapshot> {
        let p = self.providers.get(provider_id)?;
        let active = p.active.load(Ordering::SeqCst);
        let reserved = p.reserved.load(Ordering::SeqCst);
        Some(CapacitySnapshot {
            provider_id: provider_id.to_string(),
            active_requests: active,
            reserved_requests: reserved,
            available_slots: p.limits.max_concurrent as i64 - active as i64 - reserved as i64,
            queue_length: p.queue_length.load(Ordering::SeqCst),
            average_processing_time_ms: *p.average_processing_time_ms.lock().unwrap(),
            health_score: *p.health_score.lock().unwrap(),
        })
    }

    pub fn registered_providers(&self) -> Vec<String> {
        self.providers.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with(provider: &str, max_concurrent: u32) -> CapacityManager {
        let m = CapacityManager::new();
        m.register_provider(
            provider,
            CapacityLimits {
                max_concurrent,
                ..Default::default()
            },
        );
        m
    }

    #[test]
    fn reserve_is_bounded_by_max_concurrent() {
        let m = manager_with("openai", 2);
        assert!(m.reserve("openai").unwrap());
        assert!(m.reserve("openai").unwrap());
        assert!(!m.reserve("openai").unwrap());

        let snap = m.snapshot("openai").unwrap();
        assert_eq!(snap.active_requests, 2);
        assert_eq!(snap.available_slots, 0);
    }

    #[test]
    fn release_decrements_active_and_updates_ewma() {
        let m = manager_with("openai", 2);
        m.reserve("openai").unwrap();
        m.release("openai", 100.0).unwrap();
        let snap = m.snapshot("openai").unwrap();
        assert_eq!(snap.active_requests, 0);
        assert!((snap.average_processing_time_ms - 10.0).abs() < 1e-9);
    }

    #[test]
    fn release_without_matching_reserve_is_reported_not_panicked() {
        let m = manager_with("openai", 2);
        assert!(matches!(
            m.release("openai", 10.0),
            Err(CapacityError::DoubleRelease(_))
        ));
    }

    #[test]
    fn low_health_blocks_admission_at_threshold() {
        let m = manager_with("openai", 10);
        assert!(m.has_available_capacity("openai", 10).unwrap());

        // Force health below the 0.5 admission threshold directly, as a
        // sweep would after sustained high utilization.
        if let Some(p) = m.providers.get("openai") {
            *p.health_score.lock().unwrap() = 0.499;
        }
        assert!(!m.has_available_capacity("openai", 10).unwrap());
    }

    #[test]
    fn token_cap_blocks_admission_when_estimate_would_exceed_window() {
        let m = CapacityManager::new();
        m.register_provider(
            "tiny",
            CapacityLimits {
                max_concurrent: 10,
                per_minute_tokens: 100,
                ..Default::default()
            },
        );
        assert!(m.has_available_capacity("tiny", 50).unwrap());
        m.record_usage("tiny", 80).unwrap();
        assert!(!m.has_available_capacity("tiny", 50).unwrap());
    }
}
