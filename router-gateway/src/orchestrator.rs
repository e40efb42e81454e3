//! # Execution Orchestrator
//!
//! Binds the priority queue to the rest of the control plane: pop a batch,
//! select a provider, reserve capacity, call the adapter, record metrics,
//! release capacity. Failures are handed to the retry controller, which
//! either re-queues the request or declares it terminally failed.
//!
//! ```text
//! PENDING -> DISPATCHED -> ADMITTED -> EXECUTING -> {COMPLETED|FAILED|CANCELLED|TIMED_OUT}
//!                 ^                                       |
//!                 +------------- RETRY_SCHEDULED ---------+
//! ```

use crate::queue::{PriorityRequestQueue, QueuedRequest};
use crate::streaming::StreamingDispatcher;
use dashmap::DashMap;
use futures::StreamExt;
use router_sdk::capacity::CapacityManager;
use router_sdk::error::ErrorKind;
use router_sdk::models::ChatResponse;
use router_sdk::providers::{ProviderRegistry, RegisteredProvider};
use router_sdk::rate_limiter::{default_tier_limits, BurstConfig, BurstHandler, SlidingWindowLimiter};
use router_sdk::request::RouterRequest;
use router_sdk::retry::{RetryConfig, RetryController, RetryDecision};
use router_sdk::routing::{ProviderSelection, Router as ProviderRouter, ScoredCandidate};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// The explicit states a request passes through. Not all states are
/// materialized as distinct struct fields — `Dispatched`/`Admitted` are
/// transient within one iteration of [`run_once`] — but every one is
/// represented here for observability (logged at each transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Dispatched,
    Admitted,
    Executing,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
    RetryScheduled,
}

/// Bundles every collaborator the orchestrator needs, broken out as its own
/// struct to avoid a direct Provider <-> Router <-> CapacityManager <->
/// Metrics reference cycle: each collaborator only knows about the ones it
/// needs, and the orchestrator (not any one collaborator) wires them all
/// together per request.
pub struct Services {
    pub registry: Arc<ProviderRegistry>,
    pub capacity: Arc<CapacityManager>,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub burst_handler: Arc<BurstHandler>,
    pub router: Arc<ProviderRouter>,
    pub retry: Arc<RetryController>,
    pub queue: Arc<PriorityRequestQueue>,
    pub streaming: Arc<StreamingDispatcher>,
    pub retry_config: RetryConfig,
    pub burst_config: BurstConfig,
    pub results: Arc<DashMap<Uuid, RequestOutcome>>,
    /// Set by `main` on SIGTERM/Ctrl-C; observed by the worker loop between
    /// batches so it stops popping new work but lets in-flight requests run
    /// to completion within the drain deadline.
    pub shutting_down: Arc<AtomicBool>,
    /// Count of requests currently inside `run_once`, polled by `main` to
    /// decide when the drain deadline has been satisfied.
    pub in_flight: Arc<AtomicUsize>,
}

impl Services {
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// RAII guard incrementing [`Services::in_flight`] for the duration of one
/// `run_once` call, so a panic or early return still decrements it.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Structured failure detail surfaced by `GET /requests/{id}`: canonical
/// `kind`, a human-readable `message`, the number of attempts made, and the
/// last provider that was tried (if any was reached before the failure).
#[derive(Debug, Clone, Serialize)]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
    pub attempts: u32,
    pub last_provider: Option<String>,
}

/// What `GET /requests/{id}` reports back once a request has left the
/// `Pending`/`RetryScheduled` loop. Non-terminal states aren't recorded here;
/// their status comes straight from the queue instead.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub state: RequestState,
    pub response: Option<ChatResponse>,
    pub error: Option<RequestError>,
    pub provider_id: Option<String>,
    /// Total attempts made against a provider before reaching this outcome
    /// (1 on a first-try success).
    pub attempts: u32,
    /// `true` once a `provider_hint` could not be honored and a scored
    /// fallback candidate was dispatched to instead.
    pub fallback_used: bool,
    /// The provider originally requested via `provider_hint`, set whenever
    /// `fallback_used` is.
    pub original_provider: Option<String>,
}

impl RequestOutcome {
    fn terminal(state: RequestState) -> Self {
        Self {
            state,
            response: None,
            error: None,
            provider_id: None,
            attempts: 0,
            fallback_used: false,
            original_provider: None,
        }
    }

    /// A failure with no provider selection behind it yet (rate limiting,
    /// admission, routing) so there is no fallback metadata to report.
    fn failed(provider_id: Option<&str>, kind: ErrorKind, message: impl Into<String>, attempts: u32) -> Self {
        let message = message.into();
        Self {
            state: RequestState::Failed,
            response: None,
            error: Some(RequestError {
                kind,
                message,
                attempts,
                last_provider: provider_id.map(str::to_string),
            }),
            provider_id: provider_id.map(str::to_string),
            attempts,
            fallback_used: false,
            original_provider: None,
        }
    }
}

const ADMISSION_WAIT_TOLERANCE: Duration = Duration::from_secs(30);

fn cost_score(estimated_cost: f64) -> f64 {
    (1.0 - estimated_cost / 0.10).clamp(0.0, 1.0)
}

fn latency_score(p95_latency_ms: f64) -> f64 {
    (1.0 - p95_latency_ms / 5000.0).clamp(0.0, 1.0)
}

/// Drive one queued request through the state machine to a terminal state
/// (or a retry re-enqueue). Returns the final [`RequestState`].
pub async fn run_once(item: QueuedRequest, services: &Services) -> RequestState {
    let _in_flight = InFlightGuard::new(services.in_flight.clone());
    let QueuedRequest { request, enqueued_at, .. } = item;

    if request.is_cancelled() {
        services
            .results
            .insert(request.id, RequestOutcome::terminal(RequestState::Cancelled));
        return RequestState::Cancelled;
    }
    if request.is_deadline_exceeded() {
        services.queue.fail(request.id).await;
        services
            .results
            .insert(request.id, RequestOutcome::terminal(RequestState::TimedOut));
        return RequestState::TimedOut;
    }

    let tier_limits = default_tier_limits(request.tier);
    if !services
        .rate_limiter
        .check_and_record(&request.user_id, tier_limits.requests_per_minute)
    {
        warn!(user_id = %request.user_id, "rate limit exceeded, rejecting request");
        services.queue.fail(request.id).await;
        services.results.insert(
            request.id,
            RequestOutcome::failed(None, ErrorKind::RateLimited, "rate limit exceeded", request.attempts),
        );
        return RequestState::Failed;
    }

    match services.burst_handler.check(
        &request.user_id,
        1.0,
        services.burst_config,
    ) {
        router_sdk::rate_limiter::BurstDecision::Rejected { retry_after } => {
            info!(user_id = %request.user_id, ?retry_after, "burst budget exhausted");
            services.queue.fail(request.id).await;
            services.results.insert(
                request.id,
                RequestOutcome::failed(
                    None,
                    ErrorKind::CapacityExhausted,
                    "burst budget exhausted",
                    request.attempts,
                ),
            );
            return RequestState::Failed;
        }
        _ => {}
    }

    let candidates = services.registry.supporting(&request.capabilities);
    if candidates.is_empty() {
        services.queue.fail(request.id).await;
        services.results.insert(
            request.id,
            RequestOutcome::failed(
                None,
                ErrorKind::NotFound,
                "no provider supports the requested capabilities",
                request.attempts,
            ),
        );
        return RequestState::Failed;
    }

    // Owned scoring inputs, one per candidate provider. `ScoredCandidate`
    // below borrows `provider_id` from these, so they must outlive it.
    struct CandidateInputs {
        provider_id: String,
        availability: f64,
        cost_score: f64,
        success_rate: f64,
        latency_score: f64,
    }

    let mut inputs = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let provider_id = candidate.provider.name().to_string();
        // Candidates with wait time within the admission tolerance remain
        // eligible even when they can't admit right now.
        let admitted = services
            .capacity
            .has_available_capacity(&provider_id, request.estimated_input_tokens as u64)
            .unwrap_or(false);
        let estimated_cost =
            (request.estimated_input_tokens as f64 / 1000.0) * candidate.cost_per_1k_input_tokens;
        let avg_latency = services
            .capacity
            .snapshot(&provider_id)
            .map(|s| s.average_processing_time_ms)
            .unwrap_or(0.0);
        let success_rate = services
            .retry
            .learning_snapshot("chat", &provider_id)
            .map(|l| l.success_rate)
            .unwrap_or(1.0);

        inputs.push(CandidateInputs {
            provider_id,
            availability: if admitted { 1.0 } else { 0.5 },
            cost_score: cost_score(estimated_cost),
            success_rate,
            latency_score: latency_score(avg_latency),
        });
    }

    let eligible: Vec<ScoredCandidate<'_>> = inputs
        .iter()
        .map(|c| ScoredCandidate {
            provider_id: c.provider_id.as_str(),
            availability: c.availability,
            cost_score: c.cost_score,
            success_rate: c.success_rate,
            latency_score: c.latency_score,
        })
        .collect();

    if eligible.is_empty() {
        services
            .queue
            .schedule_retry(
                QueuedRequest {
                    request: request.clone(),
                    enqueued_at,
                    scheduled_at: Instant::now(),
                    status: crate::queue::QueueStatus::Pending,
                },
                ADMISSION_WAIT_TOLERANCE,
            )
            .await;
        return RequestState::RetryScheduled;
    }

    let selection = services.router.select_for_request(
        &eligible,
        request.provider_hint.as_deref(),
        request.fallback,
    );

    let Some(selection) = selection else {
        services.queue.fail(request.id).await;
        services.results.insert(
            request.id,
            RequestOutcome::failed(None, ErrorKind::NotFound, "no provider candidate could be selected", request.attempts),
        );
        return RequestState::Failed;
    };

    let Some(registered) = services.registry.get(&selection.provider_id) else {
        services.queue.fail(request.id).await;
        services.results.insert(
            request.id,
            RequestOutcome {
                state: RequestState::Failed,
                response: None,
                error: Some(RequestError {
                    kind: ErrorKind::NotFound,
                    message: "selected provider is no longer registered".to_string(),
                    attempts: request.attempts,
                    last_provider: Some(selection.provider_id.clone()),
                }),
                provider_id: Some(selection.provider_id.clone()),
                attempts: request.attempts,
                fallback_used: selection.fallback_used,
                original_provider: selection.original_provider.clone(),
            },
        );
        return RequestState::Failed;
    };

    let reserved = services
        .capacity
        .reserve(&selection.provider_id)
        .unwrap_or(false);
    if !reserved {
        services
            .queue
            .schedule_retry(
                QueuedRequest {
                    request: request.clone(),
                    enqueued_at,
                    scheduled_at: Instant::now(),
                    status: crate::queue::QueueStatus::Pending,
                },
                Duration::from_secs(1),
            )
            .await;
        return RequestState::RetryScheduled;
    }

    let started = Instant::now();
    let remaining = request
        .deadline
        .saturating_duration_since(Instant::now())
        .max(Duration::from_millis(1));

    if request.params.stream {
        return execute_streaming(request, enqueued_at, selection, registered, services, started, remaining).await;
    }

    let outcome = tokio::time::timeout(
        remaining,
        registered.provider.chat_completion(request.payload.clone()),
    )
    .await;

    let processing_time_ms = started.elapsed().as_millis() as f64;
    let _ = services
        .capacity
        .release(&selection.provider_id, processing_time_ms);

    match outcome {
        Err(_elapsed) => {
            services.retry.record_outcome(
                "chat",
                &selection.provider_id,
                false,
                request.attempts + 1,
                started.elapsed(),
            );
            handle_retryable_failure(
                request,
                enqueued_at,
                &selection.provider_id,
                selection.fallback_used,
                selection.original_provider.clone(),
                ErrorKind::Timeout,
                services,
            )
            .await
        }
        Ok(Err(provider_error)) => {
            let kind = ErrorKind::from(&provider_error);
            services.retry.record_outcome(
                "chat",
                &selection.provider_id,
                false,
                request.attempts + 1,
                started.elapsed(),
            );
            handle_retryable_failure(
                request,
                enqueued_at,
                &selection.provider_id,
                selection.fallback_used,
                selection.original_provider.clone(),
                kind,
                services,
            )
            .await
        }
        Ok(Ok(response)) => {
            let total_tokens = response.usage.as_ref().map(|u| u.total_tokens as u64).unwrap_or(0);
            let _ = services
                .capacity
                .record_usage(&selection.provider_id, total_tokens);
            services.retry.record_outcome(
                "chat",
                &selection.provider_id,
                true,
                request.attempts + 1,
                started.elapsed(),
            );
            services.queue.complete(request.id).await;
            if let Some(stream_id) = request.stream_id {
                let content = response.choices.first().map(|c| c.message.content.clone());
                services
                    .streaming
                    .publish(stream_id, content, true, total_tokens as u32, 0.0, 100.0)
                    .await;
            }
            services.results.insert(
                request.id,
                RequestOutcome {
                    state: RequestState::Completed,
                    response: Some(response),
                    error: None,
                    provider_id: Some(selection.provider_id.clone()),
                    attempts: request.attempts + 1,
                    fallback_used: selection.fallback_used,
                    original_provider: selection.original_provider.clone(),
                },
            );
            RequestState::Completed
        }
    }
}

/// Drives a provider's streaming completion to its terminal event, relaying
/// every delta through the request's `StreamSession` as it arrives instead
/// of buffering the whole response (the buffered path in [`run_once`]
/// handles `params.stream == false`).
async fn execute_streaming(
    request: RouterRequest,
    enqueued_at: Instant,
    selection: ProviderSelection,
    registered: Arc<RegisteredProvider>,
    services: &Services,
    started: Instant,
    remaining: Duration,
) -> RequestState {
    let stream_id = request.stream_id;

    let open_result = tokio::time::timeout(
        remaining,
        registered.provider.stream_chat_completion(request.payload.clone()),
    )
    .await;

    let mut stream = match open_result {
        Err(_elapsed) => {
            let _ = services
                .capacity
                .release(&selection.provider_id, started.elapsed().as_millis() as f64);
            services.retry.record_outcome(
                "chat",
                &selection.provider_id,
                false,
                request.attempts + 1,
                started.elapsed(),
            );
            return handle_retryable_failure(
                request,
                enqueued_at,
                &selection.provider_id,
                selection.fallback_used,
                selection.original_provider.clone(),
                ErrorKind::Timeout,
                services,
            )
            .await;
        }
        Ok(Err(provider_error)) => {
            let _ = services
                .capacity
                .release(&selection.provider_id, started.elapsed().as_millis() as f64);
            let kind = ErrorKind::from(&provider_error);
            services.retry.record_outcome(
                "chat",
                &selection.provider_id,
                false,
                request.attempts + 1,
                started.elapsed(),
            );
            return handle_retryable_failure(
                request,
                enqueued_at,
                &selection.provider_id,
                selection.fallback_used,
                selection.original_provider.clone(),
                kind,
                services,
            )
            .await;
        }
        Ok(Ok(stream)) => stream,
    };

    let max_tokens = request.params.max_tokens;
    let mut total_tokens: u32 = 0;
    let mut stream_error: Option<ErrorKind> = None;

    let consume_deadline = request
        .deadline
        .saturating_duration_since(Instant::now())
        .max(Duration::from_millis(1));

    let timed_out = tokio::time::timeout(consume_deadline, async {
        while let Some(chunk_result) = stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    let delta = chunk.choices.first().and_then(|c| c.delta.content.clone());
                    if let Some(text) = &delta {
                        total_tokens += (text.len() / 4).max(1) as u32;
                    }
                    if let Some(stream_id) = stream_id {
                        let progress = max_tokens
                            .map(|max| (total_tokens as f64 / max.max(1) as f64 * 100.0).min(99.0))
                            .unwrap_or(0.0);
                        let cost = (total_tokens as f64 / 1000.0) * registered.cost_per_1k_output_tokens;
                        services
                            .streaming
                            .publish(stream_id, delta, false, total_tokens, cost, progress)
                            .await;
                    }
                }
                Err(provider_error) => {
                    stream_error = Some(ErrorKind::from(&provider_error));
                    break;
                }
            }
        }
    })
    .await
    .is_err();

    let processing_time_ms = started.elapsed().as_millis() as f64;
    let _ = services
        .capacity
        .release(&selection.provider_id, processing_time_ms);

    if let Some(stream_id) = stream_id {
        let cost = (total_tokens as f64 / 1000.0) * registered.cost_per_1k_output_tokens;
        services
            .streaming
            .publish(stream_id, None, true, total_tokens, cost, 100.0)
            .await;
    }

    if timed_out {
        services.retry.record_outcome(
            "chat",
            &selection.provider_id,
            false,
            request.attempts + 1,
            started.elapsed(),
        );
        return handle_retryable_failure(
            request,
            enqueued_at,
            &selection.provider_id,
            selection.fallback_used,
            selection.original_provider.clone(),
            ErrorKind::Timeout,
            services,
        )
        .await;
    }

    if let Some(kind) = stream_error {
        services.retry.record_outcome(
            "chat",
            &selection.provider_id,
            false,
            request.attempts + 1,
            started.elapsed(),
        );
        return handle_retryable_failure(
            request,
            enqueued_at,
            &selection.provider_id,
            selection.fallback_used,
            selection.original_provider.clone(),
            kind,
            services,
        )
        .await;
    }

    services.retry.record_outcome(
        "chat",
        &selection.provider_id,
        true,
        request.attempts + 1,
        started.elapsed(),
    );
    let _ = services
        .capacity
        .record_usage(&selection.provider_id, total_tokens as u64);
    services.queue.complete(request.id).await;
    services.results.insert(
        request.id,
        RequestOutcome {
            state: RequestState::Completed,
            response: None,
            error: None,
            provider_id: Some(selection.provider_id.clone()),
            attempts: request.attempts + 1,
            fallback_used: selection.fallback_used,
            original_provider: selection.original_provider.clone(),
        },
    );
    RequestState::Completed
}

async fn handle_retryable_failure(
    mut request: RouterRequest,
    enqueued_at: Instant,
    provider_id: &str,
    fallback_used: bool,
    original_provider: Option<String>,
    kind: ErrorKind,
    services: &Services,
) -> RequestState {
    request.attempts += 1;
    request.last_error = Some(kind.clone());

    let decision = services.retry.decide(
        "exponential",
        "chat",
        provider_id,
        request.attempts,
        kind.clone(),
        request.deadline,
        &services.retry_config,
    );

    match decision {
        RetryDecision::Retry { delay } => {
            services
                .queue
                .schedule_retry(
                    QueuedRequest {
                        request,
                        enqueued_at,
                        scheduled_at: Instant::now(),
                        status: crate::queue::QueueStatus::Pending,
                    },
                    delay,
                )
                .await;
            RequestState::RetryScheduled
        }
        RetryDecision::TerminalFailure => {
            services.queue.fail(request.id).await;
            if let Some(stream_id) = request.stream_id {
                services.streaming.publish(stream_id, None, true, 0, 0.0, 100.0).await;
            }
            services.results.insert(
                request.id,
                RequestOutcome {
                    state: RequestState::Failed,
                    response: None,
                    error: Some(RequestError {
                        kind: kind.clone(),
                        message: kind.to_string(),
                        attempts: request.attempts,
                        last_provider: Some(provider_id.to_string()),
                    }),
                    provider_id: Some(provider_id.to_string()),
                    attempts: request.attempts,
                    fallback_used,
                    original_provider,
                },
            );
            RequestState::Failed
        }
    }
}

/// Spawns a fixed-size worker pool, each repeatedly popping a batch and
/// running requests concurrently within that batch. Stops popping new
/// batches once `services.shutting_down` is set, so already-admitted
/// requests can drain without new ones being dispatched underneath them;
/// `main` is responsible for waiting out the drain deadline afterward.
pub fn spawn_workers(
    services: Arc<Services>,
    batch_size: usize,
    max_concurrent: usize,
    processing_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(processing_interval);
        loop {
            ticker.tick().await;
            if services.is_shutting_down() {
                info!("queue processor stopping: shutdown in progress");
                break;
            }
            let in_flight = services.in_flight_count();
            let batch = services
                .queue
                .process_batch(batch_size, in_flight, max_concurrent)
                .await;
            if batch.is_empty() {
                continue;
            }
            let mut handles = Vec::with_capacity(batch.len());
            for item in batch {
                let services = services.clone();
                handles.push(tokio::spawn(async move {
                    run_once(item, &services).await;
                }));
            }
            for handle in handles {
                let _ = handle.await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_score_clamps_to_unit_interval() {
        assert_eq!(cost_score(0.0), 1.0);
        assert_eq!(cost_score(1.0), 0.0);
        assert!(cost_score(0.05) > 0.0 && cost_score(0.05) < 1.0);
    }

    #[test]
    fn latency_score_clamps_to_unit_interval() {
        assert_eq!(latency_score(0.0), 1.0);
        assert_eq!(latency_score(10_000.0), 0.0);
    }
}
