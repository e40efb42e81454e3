//! Handlers backing the priority-queued control plane: submitting a request,
//! polling or cancelling it, subscribing to its stream, and listing the
//! providers the router currently knows about.

use crate::gateway_error::GatewayError;
use crate::orchestrator::RequestState;
use crate::queue::QueueStatus;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use futures::stream::Stream;
use router_sdk::models::ChatRequest;
use router_sdk::request::{Capability, GenerationParams, Priority, RouterRequest, UserTier};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::convert::Infallible;
use std::time::Duration;
use uuid::Uuid;

/// Body of `POST /requests`. Mirrors `ChatRequest` plus the routing metadata
/// the OpenAI-compatible endpoints don't need: priority, tier, provider
/// hints, and a per-request cost ceiling.
#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    #[serde(flatten)]
    pub payload: ChatRequest,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    pub provider_hint: Option<String>,
    #[serde(default)]
    pub fallback: bool,
    pub max_cost: Option<f64>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_priority() -> Priority {
    Priority::Medium
}

fn user_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string()
}

fn tier_from_headers(headers: &HeaderMap) -> UserTier {
    match headers.get("x-user-tier").and_then(|v| v.to_str().ok()) {
        Some("premium") => UserTier::Premium,
        Some("enterprise") => UserTier::Enterprise,
        _ => UserTier::Basic,
    }
}

/// Submit a chat request to the priority queue instead of dispatching it
/// synchronously. Returns the queued request's id and the stream id a
/// caller can subscribe to for progress/chunk events.
pub async fn submit_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SubmitRequestBody>,
) -> Result<Json<Value>, GatewayError> {
    let user_id = user_id_from_headers(&headers);
    let tier = tier_from_headers(&headers);

    let capabilities: HashSet<Capability> = if body.capabilities.is_empty() {
        HashSet::from([Capability::TextGeneration])
    } else {
        body.capabilities.into_iter().collect()
    };

    let stream = body.payload.stream.unwrap_or(false);
    let mut request = RouterRequest::new(
        user_id,
        tier,
        body.priority,
        capabilities,
        body.payload,
        GenerationParams {
            stream,
            ..GenerationParams::default()
        },
        Duration::from_secs(body.timeout_secs),
    );
    request.provider_hint = body.provider_hint;
    request.fallback = body.fallback;
    request.max_cost = body.max_cost;

    let request_id = request.id;
    let session = state.router_services.streaming.create_session(request_id);
    request.stream_id = Some(session.stream_id);

    state
        .router_services
        .queue
        .enqueue(request)
        .await
        .map_err(|err| GatewayError::InvalidRequest {
            message: err.to_string(),
        })?;

    Ok(Json(json!({
        "id": request_id,
        "stream_id": session.stream_id,
        "status": "pending",
    })))
}

/// Poll a submitted request's status. Terminal states report the completed
/// `RequestOutcome`; non-terminal states fall back to the queue's status.
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, Response> {
    let services = &state.router_services;

    if let Some(outcome) = services.results.get(&id) {
        return Ok(Json(json!({
            "id": id,
            "state": format!("{:?}", outcome.state),
            "attempts": outcome.attempts,
            "response": outcome.response,
            "error": outcome.error,
            "provider_id": outcome.provider_id,
            "fallback_used": outcome.fallback_used,
            "original_provider": outcome.original_provider,
        })));
    }

    match services.queue.status(id).await {
        Some(QueueStatus::Pending) => Ok(Json(json!({ "id": id, "state": "Pending" }))),
        Some(QueueStatus::Processing) => Ok(Json(json!({ "id": id, "state": "Executing" }))),
        Some(QueueStatus::Cancelled) => Ok(Json(json!({ "id": id, "state": "Cancelled" }))),
        Some(QueueStatus::Completed) => Ok(Json(json!({ "id": id, "state": "Completed" }))),
        Some(QueueStatus::Failed) => Ok(Json(json!({ "id": id, "state": "Failed" }))),
        None => Err(not_found(id)),
    }
}

/// Cancel a pending or in-flight request. Idempotent on an already-terminal
/// request in the sense that cancelling it again reports the same 404 a
/// forgotten id would.
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    state
        .router_services
        .queue
        .cancel(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|_| not_found(id))
}

fn not_found(id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no request with id {id}") })),
    )
        .into_response()
}

/// Subscribe to a stream's chunk/progress/heartbeat events over SSE. A
/// `done` event closes the stream from the server side; the client is free
/// to disconnect earlier.
pub async fn stream_events(
    State(state): State<AppState>,
    Path(stream_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response> {
    let dispatcher = state.router_services.streaming.clone();
    if dispatcher.session(stream_id).is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no stream with id {stream_id}") })),
        )
            .into_response());
    }

    let subscriber_id = Uuid::new_v4();
    let receiver = dispatcher
        .subscribe(stream_id, subscriber_id)
        .await
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("no stream with id {stream_id}") })),
            )
                .into_response()
        })?;

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("open").data(stream_id.to_string()));

        let mut receiver = receiver;
        while let Some(event) = receiver.recv().await {
            // Heartbeats carry no content and a sentinel negative progress
            // (StreamingDispatcher::heartbeat publishes exactly this shape).
            let name = if event.content.is_none() && !event.done && event.progress < 0.0 {
                "heartbeat"
            } else if event.done {
                "done"
            } else {
                "chunk"
            };
            let data = json!({
                "content": event.content,
                "tokens": event.tokens,
                "cost": event.cost,
                "progress": event.progress,
            });
            yield Ok(Event::default().event(name).json_data(data).unwrap_or_else(|_| Event::default()));
            if event.done {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// List every provider the router currently knows about: `{id,
/// capabilities, healthScore, utilization, p95LatencyMs, successRate}` per
/// the `GET /providers` contract, plus the full capacity snapshot and
/// declared pricing for callers that want more detail.
pub async fn list_router_providers(State(state): State<AppState>) -> Json<Value> {
    let services = &state.router_services;
    let aggregated = crate::metrics::get_aggregated_metrics().await;

    let providers: Vec<Value> = services
        .registry
        .provider_ids()
        .into_iter()
        .map(|id| {
            let registered = services.registry.get(&id);
            let snapshot = services.capacity.snapshot(&id);
            let limits = services.capacity.limits(&id);
            let utilization = snapshot.as_ref().zip(limits.as_ref()).map(|(s, l)| {
                (s.active_requests + s.reserved_requests) as f64 / l.max_concurrent.max(1) as f64
            });
            let provider_metrics = aggregated.provider_stats.get(&id);

            json!({
                "id": id,
                "capabilities": registered.as_ref().map(|r| r.capabilities.clone()),
                "health_score": snapshot.as_ref().map(|s| s.health_score),
                "utilization": utilization,
                "p95_latency_ms": provider_metrics.map(|m| m.p95_latency_ms),
                "success_rate": provider_metrics.map(|m| {
                    if m.requests == 0 { 1.0 } else { m.successful_requests as f64 / m.requests as f64 }
                }),
                "cost_per_1k_input_tokens": registered.as_ref().map(|r| r.cost_per_1k_input_tokens),
                "cost_per_1k_output_tokens": registered.as_ref().map(|r| r.cost_per_1k_output_tokens),
                "capacity": snapshot,
            })
        })
        .collect();

    Json(json!({ "providers": providers }))
}

// The orchestrator's terminal states double as the vocabulary `get_request`
// reports by name; keep the match above exhaustive if new ones are added.
#[allow(dead_code)]
fn _exhaustiveness_check(state: RequestState) -> &'static str {
    match state {
        RequestState::Pending => "Pending",
        RequestState::Dispatched => "Dispatched",
        RequestState::Admitted => "Admitted",
        RequestState::Executing => "Executing",
        RequestState::Completed => "Completed",
        RequestState::Failed => "Failed",
        RequestState::Cancelled => "Cancelled",
        RequestState::TimedOut => "TimedOut",
        RequestState::RetryScheduled => "RetryScheduled",
    }
}
