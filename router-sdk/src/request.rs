//! # Canonical Router Request Model
//!
//! This module defines the envelope the rest of the control plane operates
//! on: a provider-agnostic request carrying a user's generation payload plus
//! the scheduling metadata (tier, priority, capability needs, cost ceiling,
//! deadline) that the queue, router, capacity manager and retry controller
//! all read.
//!
//! The existing [`crate::models::ChatRequest`]/[`crate::models::Message`]
//! types continue to model the provider-facing payload shape (messages,
//! generation parameters); [`RouterRequest`] wraps one of those as its
//! `payload` rather than re-describing it.

use crate::models::ChatRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// User account tier. Controls rate and burst caps (see
/// [`crate::rate_limiter`]) and contributes to a request's priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    Basic,
    Premium,
    Enterprise,
}

/// Request priority as declared by the caller. Combined with `UserTier` and
/// an age bonus to produce the queue's priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Base weight used in the priority score formula. Higher weight means
    /// dispatched sooner.
    pub fn weight(self) -> f64 {
        match self {
            Priority::Critical => 1000.0,
            Priority::High => 100.0,
            Priority::Medium => 10.0,
            Priority::Low => 1.0,
        }
    }
}

/// An abstract feature tag a request requires and a provider advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TextGeneration,
    CodeGeneration,
    Embedding,
    ImageGeneration,
    AudioTranscription,
    TextToSpeech,
}

/// Generation parameters carried alongside the prompt payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub stop: Option<Vec<String>>,
    pub stream: bool,
}

/// A handle a caller or the orchestrator can use to cooperatively cancel a
/// request. Cheap to clone; all clones observe the same cancellation flag.
///
/// Modeled as `Arc<AtomicBool>` rather than pulling in `tokio-util`'s
/// `CancellationToken` — direct primitives over an extra dependency for
/// something this small.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the request cancelled. Idempotent: cancelling twice is a no-op.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The canonical request envelope. Identified by `id`; immutable after
/// creation except for `attempts` and `last_error`, which the orchestrator
/// and retry controller mutate as the request moves through the system.
#[derive(Debug, Clone)]
pub struct RouterRequest {
    pub id: Uuid,
    pub user_id: String,
    pub tier: UserTier,
    pub priority: Priority,
    pub capabilities: HashSet<Capability>,
    pub provider_hint: Option<String>,
    pub model_hint: Option<String>,
    pub fallback: bool,
    pub payload: ChatRequest,
    pub params: GenerationParams,
    pub estimated_input_tokens: u32,
    pub max_cost: Option<f64>,
    pub timeout: Duration,
    pub deadline: Instant,
    pub cancellation: CancellationHandle,
    pub attempts: u32,
    pub last_error: Option<crate::error::ErrorKind>,
    /// Id of the `StreamSession` a caller can subscribe to for this
    /// request's chunks, when `params.stream` is set. Assigned by the
    /// gateway before enqueueing; `None` for requests submitted without
    /// streaming.
    pub stream_id: Option<Uuid>,
}

impl RouterRequest {
    /// Build a new request with a fresh id and a deadline computed as
    /// `now + timeout`.
    pub fn new(
        user_id: impl Into<String>,
        tier: UserTier,
        priority: Priority,
        capabilities: HashSet<Capability>,
        payload: ChatRequest,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        // The source estimates tokens as `len/4`; real tokenization differs
        // per provider, so this estimate is tracked separately from
        // accounting and replaced by the adapter's reported usage.
        let estimated_input_tokens = payload
            .messages
            .iter()
            .map(|m| (m.content.len() / 4) as u32)
            .sum();

        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            tier,
            priority,
            capabilities,
            provider_hint: None,
            model_hint: None,
            fallback: false,
            payload,
            params,
            estimated_input_tokens,
            max_cost: None,
            timeout,
            deadline: Instant::now() + timeout,
            cancellation: CancellationHandle::new(),
            attempts: 0,
            last_error: None,
            stream_id: None,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;

    fn sample_request() -> RouterRequest {
        let payload = ChatRequest {
            model: "gpt-4".to_string(),
            messages: vec![Message::user("capital of France")],
            ..Default::default()
        };
        RouterRequest::new(
            "user-1",
            UserTier::Premium,
            Priority::Medium,
            HashSet::from([Capability::TextGeneration]),
            payload,
            GenerationParams {
                max_tokens: Some(50),
                ..Default::default()
            },
            Duration::from_secs(30),
        )
    }

    #[test]
    fn estimates_tokens_from_message_length() {
        let req = sample_request();
        // "capital of France" is 18 chars -> 18/4 = 4
        assert_eq!(req.estimated_input_tokens, 4);
    }

    #[test]
    fn cancellation_is_idempotent_and_shared_across_clones() {
        let req = sample_request();
        let handle = req.cancellation.clone();
        assert!(!req.is_cancelled());
        handle.cancel();
        assert!(req.is_cancelled());
        handle.cancel();
        assert!(req.is_cancelled());
    }

    #[test]
    fn priority_weight_orders_critical_above_low() {
        assert!(Priority::Critical.weight() > Priority::High.weight());
        assert!(Priority::High.weight() > Priority::Medium.weight());
        assert!(Priority::Medium.weight() > Priority::Low.weight());
    }
}
