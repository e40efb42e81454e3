//! # Retry Controller
//!
//! A pluggable strategy registry (`exponential`, `linear`, `fixed`,
//! `fibonacci`, `adaptive`) that decides, after a retryable failure, whether
//! another attempt is warranted and how long to wait before making it. The
//! adaptive strategy additionally consults a learning record keyed by
//! `(operation, providerId)` so that delay and retry eligibility improve
//! with observed outcomes over time.

use crate::error::ErrorKind;
use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Tunables shared by every strategy, matching the `retry` section of the
/// external configuration schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_range: f64,
    pub adaptive_factor: f64,
    pub learning_enabled: bool,
    pub success_threshold: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(32),
            backoff_multiplier: 2.0,
            jitter_range: 0.1,
            adaptive_factor: 0.5,
            learning_enabled: true,
            success_threshold: 0.7,
        }
    }
}

/// Everything a strategy needs to decide the next delay / eligibility.
pub struct RetryContext<'a> {
    pub operation: &'a str,
    pub provider_id: &'a str,
    pub attempt: u32,
    pub error_kind: ErrorKind,
    pub deadline: Instant,
    pub config: &'a RetryConfig,
}

/// A pluggable backoff strategy.
pub trait RetryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether another attempt should be scheduled at all. Does not need to
    /// check `max_attempts`/deadline/non-retryable kinds — the controller
    /// checks those centrally before ever consulting a strategy.
    fn should_retry(&self, ctx: &RetryContext<'_>, learning: Option<&LearningRecord>) -> bool {
        let _ = (ctx, learning);
        true
    }

    /// Base delay before jitter and the max-delay cap are applied.
    fn base_delay(&self, ctx: &RetryContext<'_>, learning: Option<&LearningRecord>) -> Duration;
}

fn apply_jitter_and_cap(delay: Duration, config: &RetryConfig) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor = rng.gen_range(-config.jitter_range..=config.jitter_range);
    let jittered = delay.as_secs_f64() * (1.0 + jitter_factor);
    let capped = jittered.max(0.0).min(config.max_delay.as_secs_f64());
    Duration::from_secs_f64(capped)
}

pub struct ExponentialStrategy;
impl RetryStrategy for ExponentialStrategy {
    fn name(&self) -> &'static str {
        "exponential"
    }
    fn base_delay(&self, ctx: &RetryContext<'_>, _learning: Option<&LearningRecord>) -> Duration {
        let exp = ctx.config.backoff_multiplier.powi(ctx.attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(ctx.config.base_delay.as_secs_f64() * exp)
    }
}

pub struct LinearStrategy;
impl RetryStrategy for LinearStrategy {
    fn name(&self) -> &'static str {
        "linear"
    }
    fn base_delay(&self, ctx: &RetryContext<'_>, _learning: Option<&LearningRecord>) -> Duration {
        Duration::from_secs_f64(ctx.config.base_delay.as_secs_f64() * ctx.attempt as f64)
    }
}

pub struct FixedStrategy;
impl RetryStrategy for FixedStrategy {
    fn name(&self) -> &'static str {
        "fixed"
    }
    fn base_delay(&self, ctx: &RetryContext<'_>, _learning: Option<&LearningRecord>) -> Duration {
        ctx.config.base_delay
    }
}

pub struct FibonacciStrategy;
impl FibonacciStrategy {
    fn fib(n: u32) -> u64 {
        let (mut a, mut b) = (1u64, 1u64);
        for _ in 1..n {
            let next = a + b;
            a = b;
            b = next;
        }
        a
    }
}
impl RetryStrategy for FibonacciStrategy {
    fn name(&self) -> &'static str {
        "fibonacci"
    }
    fn base_delay(&self, ctx: &RetryContext<'_>, _learning: Option<&LearningRecord>) -> Duration {
        let multiple = Self::fib(ctx.attempt.max(1));
        Duration::from_secs_f64(ctx.config.base_delay.as_secs_f64() * multiple as f64)
    }
}

/// Consults the learning record for `(operation, provider)` and scales the
/// observed average duration by `1 + adaptiveFactor*(attempt-1)`. Falls back
/// to exponential behavior when no record exists yet.
pub struct AdaptiveStrategy;
impl RetryStrategy for AdaptiveStrategy {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn should_retry(&self, ctx: &RetryContext<'_>, learning: Option<&LearningRecord>) -> bool {
        match learning {
            Some(record) if record.sample_size >= 10 && record.success_rate < 0.3 => {
                ctx.attempt < 2
            }
            _ => true,
        }
    }

    fn base_delay(&self, ctx: &RetryContext<'_>, learning: Option<&LearningRecord>) -> Duration {
        match learning {
            Some(record) if record.sample_size > 0 => {
                let factor = 1.0 + ctx.config.adaptive_factor * (ctx.attempt.saturating_sub(1) as f64);
                Duration::from_secs_f64((record.avg_total_duration.as_secs_f64() * factor).max(0.0))
            }
            _ => ExponentialStrategy.base_delay(ctx, learning),
        }
    }
}

/// Running statistics for a `(operation, providerId)` pair, updated after
/// every terminal attempt. Samples older than 7 days with `sample_size < 10`
/// are evictable (enforced lazily on access, matching the capacity
/// manager's window eviction style).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningRecord {
    pub sample_size: u64,
    pub success_rate: f64,
    pub avg_attempts: f64,
    pub avg_total_duration: Duration,
    pub adapted_base_delay: Duration,
    pub adapted_multiplier: f64,
    #[serde(skip, default = "Instant::now")]
    pub last_updated: Instant,
}

impl Default for LearningRecord {
    fn default() -> Self {
        Self {
            sample_size: 0,
            success_rate: 1.0,
            avg_attempts: 1.0,
            avg_total_duration: Duration::from_millis(500),
            adapted_base_delay: Duration::from_millis(100),
            adapted_multiplier: 2.0,
            last_updated: Instant::now(),
        }
    }
}

const LEARNING_RECORD_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 3600);
const LEARNING_RECORD_MIN_SAMPLES: u64 = 10;

/// Strategy registry plus the learning table, shared via the services
/// container. `(operation, provider)` updates are not individually locked —
/// `DashMap`'s per-shard locking gives at-most-one-updater-per-key in
/// practice, matching the "no nested locks" discipline.
#[derive(Default)]
pub struct RetryController {
    learning: DashMap<(String, String), LearningRecord>,
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Schedule another attempt after `delay`.
    Retry { delay: Duration },
    /// Give up; the request moves to its terminal failed state.
    TerminalFailure,
}

impl RetryController {
    pub fn new() -> Self {
        Self::default()
    }

    fn strategy_for(name: &str) -> Box<dyn RetryStrategy> {
        match name {
            "linear" => Box::new(LinearStrategy),
            "fixed" => Box::new(FixedStrategy),
            "fibonacci" => Box::new(FibonacciStrategy),
            "adaptive" => Box::new(AdaptiveStrategy),
            _ => Box::new(ExponentialStrategy),
        }
    }

    /// Decide whether `attempt` (the attempt that just failed with
    /// `error_kind`) should be followed by a retry, and if so after what
    /// delay. Non-retryable kinds, `max_attempts`, and the request deadline
    /// are enforced here regardless of the chosen strategy.
    pub fn decide(
        &self,
        strategy_name: &str,
        operation: &str,
        provider_id: &str,
        attempt: u32,
        error_kind: ErrorKind,
        deadline: Instant,
        config: &RetryConfig,
    ) -> RetryDecision {
        if !error_kind.is_retryable() {
            return RetryDecision::TerminalFailure;
        }
        if attempt >= config.max_attempts {
            return RetryDecision::TerminalFailure;
        }
        if Instant::now() >= deadline {
            return RetryDecision::TerminalFailure;
        }

        let key = (operation.to_string(), provider_id.to_string());
        let learning = if config.learning_enabled {
            self.learning.get(&key).map(|r| r.clone())
        } else {
            None
        };

        // Strategy selection bias: with >=10 samples and a success rate
        // >=0.7, favor fixed/linear over exponential to avoid overshooting
        // delay on operations that are already reliable.
        let effective_name = match &learning {
            Some(record)
                if strategy_name == "exponential"
                    && record.sample_size >= LEARNING_RECORD_MIN_SAMPLES
                    && record.success_rate >= config.success_threshold =>
            {
                "linear"
            }
            _ => strategy_name,
        };

        let strategy = Self::strategy_for(effective_name);
        let ctx = RetryContext {
            operation,
            provider_id,
            attempt,
            error_kind,
            deadline,
            config,
        };

        if !strategy.should_retry(&ctx, learning.as_ref()) {
            return RetryDecision::TerminalFailure;
        }

        let delay = apply_jitter_and_cap(strategy.base_delay(&ctx, learning.as_ref()), config);
        RetryDecision::Retry { delay }
    }

    /// Fold a terminal attempt's outcome into the learning record for
    /// `(operation, provider)`. Called once the request reaches a terminal
    /// state (success, failure, cancellation, or timeout).
    pub fn record_outcome(
        &self,
        operation: &str,
        provider_id: &str,
        success: bool,
        attempts: u32,
        total_duration: Duration,
    ) {
        let key = (operation.to_string(), provider_id.to_string());
        let mut record = self.learning.entry(key).or_default();

        self.evict_if_stale(&mut record);

        let n = record.sample_size as f64;
        let outcome = if success { 1.0 } else { 0.0 };
        record.success_rate = (record.success_rate * n + outcome) / (n + 1.0);
        record.avg_attempts = (record.avg_attempts * n + attempts as f64) / (n + 1.0);
        let avg_secs = (record.avg_total_duration.as_secs_f64() * n + total_duration.as_secs_f64())
            / (n + 1.0);
        record.avg_total_duration = Duration::from_secs_f64(avg_secs.max(0.0));
        record.sample_size += 1;
        record.last_updated = Instant::now();
    }

    fn evict_if_stale(&self, record: &mut LearningRecord) {
        if record.sample_size < LEARNING_RECORD_MIN_SAMPLES
            && record.last_updated.elapsed() > LEARNING_RECORD_MAX_AGE
        {
            *record = LearningRecord::default();
        }
    }

    pub fn learning_snapshot(&self, operation: &str, provider_id: &str) -> Option<LearningRecord> {
        self.learning
            .get(&(operation.to_string(), provider_id.to_string()))
            .map(|r| r.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn far_future() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[test]
    fn non_retryable_kinds_never_retry() {
        let controller = RetryController::new();
        let config = RetryConfig::default();
        let decision = controller.decide(
            "chat",
            "openai",
            1,
            ErrorKind::InvalidRequest,
            far_future(),
            &config,
        );
        assert_eq!(decision, RetryDecision::TerminalFailure);
    }

    #[test]
    fn max_attempts_zero_means_attempted_once_never_retried() {
        let controller = RetryController::new();
        let mut config = RetryConfig::default();
        config.max_attempts = 0;
        let decision = controller.decide(
            "chat",
            "openai",
            1,
            ErrorKind::ServerError,
            far_future(),
            &config,
        );
        assert_eq!(decision, RetryDecision::TerminalFailure);
    }

    #[test]
    fn exponential_delay_grows_and_respects_jitter_bounds() {
        let controller = RetryController::new();
        let mut config = RetryConfig::default();
        config.base_delay = Duration::from_millis(100);
        config.jitter_range = 0.1;
        config.learning_enabled = false;

        let RetryDecision::Retry { delay } = controller.decide(
            "exponential",
            "openai",
            1,
            ErrorKind::ServerError,
            far_future(),
            &config,
        ) else {
            panic!("expected retry");
        };
        assert!(delay.as_millis() >= 90 && delay.as_millis() <= 110);

        let RetryDecision::Retry { delay } = controller.decide(
            "exponential",
            "openai",
            2,
            ErrorKind::ServerError,
            far_future(),
            &config,
        ) else {
            panic!("expected retry");
        };
        assert!(delay.as_millis() >= 180 && delay.as_millis() <= 220);
    }

    #[test]
    fn past_deadline_is_terminal_even_if_attempts_remain() {
        let controller = RetryController::new();
        let config = RetryConfig::default();
        let past = Instant::now() - Duration::from_secs(1);
        let decision = controller.decide(
            "exponential",
            "openai",
            1,
            ErrorKind::Timeout,
            past,
            &config,
        );
        assert_eq!(decision, RetryDecision::TerminalFailure);
    }

    #[test]
    fn adaptive_shuts_off_retries_after_two_attempts_when_success_rate_is_low() {
        let controller = RetryController::new();
        for _ in 0..20 {
            controller.record_outcome("chat", "flaky", false, 1, Duration::from_millis(10));
        }
        let config = RetryConfig::default();
        let decision = controller.decide(
            "adaptive",
            "flaky",
            3,
            ErrorKind::ServerError,
            far_future(),
            &config,
        );
        assert_eq!(decision, RetryDecision::TerminalFailure);
    }

    #[test]
    fn same_attempt_and_state_yields_same_delay_deterministically_modulo_jitter() {
        let controller = RetryController::new();
        let mut config = RetryConfig::default();
        config.jitter_range = 0.0;
        config.learning_enabled = false;
        let d1 = controller.decide("fixed", "openai", 1, ErrorKind::Network, far_future(), &config);
        let d2 = controller.decide("fixed", "openai", 1, ErrorKind::Network, far_future(), &config);
        assert_eq!(d1, d2);
    }
}
