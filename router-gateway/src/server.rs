//! # HTTP Server Module
//!
//! This module provides the HTTP server setup and configuration for the Router Gateway.
//! It handles server initialization, middleware setup, routing, and application state management.
//!
//! ## Overview
//!
//! The server module is responsible for:
//! - **Server Initialization**: Setting up the HTTP server with Axum
//! - **Middleware Configuration**: Authentication, CORS, logging, metrics, and plugins
//! - **Route Registration**: API endpoints for chat, embeddings, and admin functions
//! - **Application State**: Shared state across all handlers
//! - **Plugin Integration**: Dynamic plugin loading and management
//!
//! ## Architecture
//!
//! The server uses Axum as the web framework with the following layers:
//!
//! 1. **Timeout Layer**: Request timeout handling
//! 2. **CORS Middleware**: Cross-origin resource sharing
//! 3. **Logging Middleware**: Request/response logging
//! 4. **Metrics Middleware**: Performance monitoring
//! 5. **Authentication Middleware**: API key and JWT validation
//! 6. **Input Validation Middleware**: Request validation and sanitization
//! 7. **Plugin Middleware**: Dynamic request/response modification
//!
//! ## API Endpoints
//!
//! ### Core API Endpoints
//!
//! - `POST /v1/chat/completions` - Chat completion API
//! - `POST /v1/embeddings` - Text embedding API
//! - `POST /v1/images/generations` - Image generation API
//!
//! ### Admin Endpoints
//!
//! - `GET /health` - Health check endpoint
//! - `GET /metrics` - Performance metrics
//! - `GET /admin/providers` - Provider status
//! - `GET /admin/config` - Configuration status
//!
//! ### WebSocket Endpoints
//!
//! - `GET /ws/dashboard` - Real-time dashboard WebSocket
//!
//! ## Usage
//!
//! ```rust
//! use router_gateway::server::create_server;
//! use router_gateway::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml")?;
//!     let (app, _services) = create_server(config).await?;
//!
//!     // The server is ready to handle requests
//!     Ok(())
//! }
//! ```
//!
//! ## Middleware Stack
//!
//! The server applies middleware in the following order:
//!
//! 1. **Timeout**: Ensures requests don't hang indefinitely
//! 2. **CORS**: Handles cross-origin requests
//! 3. **Logging**: Records request/response details
//! 4. **Metrics**: Tracks performance metrics
//! 5. **Authentication**: Validates API keys and JWT tokens
//! 6. **Input Validation**: Validates and sanitizes requests
//! 7. **Plugin Processing**: Applies dynamic plugins
//!
//! ## Application State
//!
//! The `AppState` struct contains shared state accessible to all handlers:
//!
//! - **Configuration**: Server and provider configuration
//! - **Client**: Router SDK client for provider communication
//! - **Plugin Manager**: Dynamic plugin management
//! - **Cache Manager**: Redis and in-memory caching
//! - **WebSocket Manager**: Real-time dashboard connections
//!
//! ## Error Handling
//!
//! The server includes comprehensive error handling:
//!
//! - **Timeout Errors**: Automatic request cancellation
//! - **Authentication Errors**: Proper HTTP status codes
//! - **Validation Errors**: Detailed error messages
//! - **Provider Errors**: Graceful fallback handling
//! - **Plugin Errors**: Non-blocking plugin failures

use crate::config::Config;
use crate::gateway_caching::CacheManager;
use crate::handlers;
use crate::middleware::{auth_middleware, cors_middleware, logging_middleware, metrics_middleware};
use crate::orchestrator::{self, Services};
use crate::queue::PriorityRequestQueue;
use crate::streaming::StreamingDispatcher;
use axum::{
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use router_sdk::capacity::CapacityManager;
use router_sdk::providers::ProviderRegistry;
use router_sdk::rate_limiter::{BurstHandler, SlidingWindowLimiter};
use router_sdk::retry::RetryController;
use router_sdk::routing::Router as ProviderRouter;
use router_sdk::RouterClient;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

/// Application state shared across all HTTP handlers.
///
/// Contains all the necessary components for handling requests:
/// configuration, client, plugins, caching, and WebSocket management.
///
/// # Thread Safety
///
/// All fields are wrapped in `Arc` for thread-safe sharing across
/// multiple request handlers.
///
/// # Example
///
/// ```rust
/// let app_state = AppState {
///     config: Arc::new(config),
///     client: Arc::new(client),
///     plugin_manager: Arc::new(plugin_manager),
///     cache_manager: Arc::new(cache_manager),
///     websocket_manager: Some(Arc::new(websocket_manager)),
/// };
/// ```
pub struct AppState {
    /// Server and provider configuration
    pub config: Arc<Config>,
    /// Router SDK client for provider communication
    pub client: Arc<RouterClient>,
    /// Redis and in-memory caching layer
    pub cache_manager: Arc<CacheManager>,
    /// Priority queue, capacity/rate/retry control plane, and streaming
    /// dispatcher backing the `/requests`, `/streams`, `/providers` routes
    pub router_services: Arc<Services>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            client: self.client.clone(),
            cache_manager: self.cache_manager.clone(),
            router_services: self.router_services.clone(),
        }
    }
}

/// Create and configure the HTTP server with all middleware and routes.
///
/// This function initializes all components of the gateway:
/// - Router SDK client with configured providers
/// - Cache manager (Redis or in-memory)
/// - Authentication service and rate limiter
/// - Metrics collection system
/// - Plugin manager with configured plugins
/// - WebSocket manager for real-time dashboard
/// - HTTP server with middleware stack and routes
///
/// # Arguments
///
/// * `config` - The gateway configuration containing all settings
///
/// # Returns
///
/// Returns a configured Axum router ready to handle HTTP requests.
///
/// # Errors
///
/// Returns an error if:
/// - SDK client cannot be created
/// - Cache manager cannot be initialized
/// - Authentication service cannot be set up
/// - Metrics system cannot be initialized
/// - Plugin manager cannot be created
///
/// # Example
///
/// ```rust
/// let config = Config::load("config.toml")?;
/// let app = create_server(config).await?;
/// ```
pub async fn create_server(config: Config) -> anyhow::Result<(Router, Arc<orchestrator::Services>)> {
    // Create the SDK client in standalone mode with configured providers
    let mut client_builder = RouterClient::standalone();

    // Add configured providers to the client
    for (name, provider_config) in &config.providers {
        client_builder = client_builder.with_provider(name.clone(), provider_config.clone());
    }

    // If no providers configured, add Ollama as default for development
    if config.providers.is_empty() {
        client_builder = client_builder.with_ollama("http://localhost:11434");
    }

    // Build the client with the configured routing strategy
    let client = client_builder
        .with_routing_strategy(config.routing.strategy.clone())
        .build()?;

    // Initialize cache manager with the configured backend
    let cache_manager = Arc::new(CacheManager::new(config.cache.clone()).await?);

    // Initialize authentication service and rate limiter with cache manager
    crate::auth::initialize_auth_service(config.auth.clone(), cache_manager.clone()).await;

    // Perform security sanity check for JWT secrets
    if let Err(e) = {
        // Create a temporary auth service instance for sanity checking
        let tmp = crate::auth::AuthService::new(config.auth.clone());
        tmp.sanity_check()
    } {
        return Err(anyhow::anyhow!(e.to_string()));
    }

    // Initialize rate limiter with cache manager for distributed rate limiting
    crate::auth::initialize_rate_limiter(cache_manager.clone()).await?;

    let router_services = Arc::new(build_router_services(&config)?);
    spawn_router_background_tasks(router_services.clone(), &config);

    // Initialize metrics collector with configuration
    let metrics_config = crate::metrics::MetricsConfig {
        enabled: config.metrics.enabled,
        max_requests: config.metrics.max_requests,
        retention_duration: config.metrics.retention_duration,
        cleanup_interval: config.metrics.cleanup_interval,
    };
    crate::metrics::initialize_metrics(metrics_config).await;

    let state = AppState {
        config: Arc::new(config.clone()),
        client: Arc::new(client),
        cache_manager,
        router_services,
    };

    // Warn if permissive CORS is used in production-like settings
    if config.server.cors.enabled && config.server.cors.allowed_origins.iter().any(|o| o == "*") {
        tracing::warn!(
            "CORS is enabled with wildcard origins. This is unsafe for production. Configure explicit allowed_origins."
        );
    }

    // Create the main router
    let app = Router::new()
        // OpenAI-compatible endpoints
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route("/v1/completions", post(handlers::completions))
        .route("/v1/embeddings", post(handlers::embeddings))
        .route("/v1/images/generations", post(handlers::image_generations))
        .route(
            "/v1/audio/transcriptions",
            post(handlers::audio_transcriptions),
        )
        .route("/v1/audio/speech", post(handlers::text_to_speech))
        .route("/v1/models", get(handlers::list_models))
        // Health and admin endpoints
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/metrics/prometheus", get(handlers::prometheus_metrics))
        .route("/admin/providers", get(handlers::list_providers))
        .route("/admin/config", get(handlers::get_config))
        .route(
            "/admin/circuit-breakers",
            get(handlers::get_circuit_breaker_metrics),
        )
        .route("/admin/alerts", get(handlers::list_alerts))
        // Router control-plane endpoints (priority queue, request status, streams)
        .route("/requests", post(handlers::router_api::submit_request))
        .route(
            "/requests/{id}",
            get(handlers::router_api::get_request).delete(handlers::router_api::cancel_request),
        )
        .route("/streams/{stream_id}", get(handlers::router_api::stream_events))
        .route("/providers", get(handlers::router_api::list_router_providers))
        // Middleware stack
        .layer(
            ServiceBuilder::new()
                .layer(cors_middleware(&config.server.cors)) // 1. CORS (first)
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )) // 2. Authentication (includes rate limiting)
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    logging_middleware,
                )) // 3. Logging (only authenticated requests)
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                )) // 4. Metrics (only authenticated requests)
                .layer(TimeoutLayer::new(config.server.timeout)), // 5. Timeout (last)
        )
        .with_state(state.clone());

    Ok((app, state.router_services))
}

/// Build every control-plane collaborator the orchestrator needs (the
/// services container) from the loaded configuration: a provider registry
/// mirroring `config.providers` with their declared capabilities/cost/
/// capacity limits, the capacity manager, rate limiter, burst handler,
/// retry controller, scored router, priority queue, and streaming
/// dispatcher.
fn build_router_services(config: &Config) -> anyhow::Result<Services> {
    let registry = Arc::new(ProviderRegistry::new());
    let capacity = Arc::new(CapacityManager::new());

    for (name, provider_config) in &config.providers {
        if !provider_config.enabled {
            continue;
        }
        let adapter = router_sdk::providers::create_provider_with_circuit_breaker(
            provider_config.clone(),
            provider_config.circuit_breaker.clone(),
        )?;
        registry.register(
            Arc::from(adapter),
            provider_config.capabilities.clone(),
            provider_config.cost_per_1k_input_tokens,
            provider_config.cost_per_1k_output_tokens,
        );
        capacity.register_provider(name.clone(), provider_config.capacity_limits.clone());
    }

    // A deployment with no providers configured still needs at least one
    // candidate to route to in development, matching the legacy client's
    // Ollama fallback above.
    if registry.provider_ids().is_empty() {
        let fallback = router_sdk::providers::ProviderConfig::new("ollama", "")
            .with_base_url("http://localhost:11434");
        let adapter = router_sdk::providers::create_provider(fallback.clone())?;
        registry.register(
            Arc::from(adapter),
            fallback.capabilities.clone(),
            fallback.cost_per_1k_input_tokens,
            fallback.cost_per_1k_output_tokens,
        );
        capacity.register_provider("ollama", fallback.capacity_limits.clone());
    }

    Ok(Services {
        registry,
        capacity,
        rate_limiter: Arc::new(SlidingWindowLimiter::new()),
        burst_handler: Arc::new(BurstHandler::new()),
        router: Arc::new(ProviderRouter::new(router_sdk::routing::RoutingStrategy::Scored)),
        retry: Arc::new(RetryController::new()),
        queue: Arc::new(PriorityRequestQueue::new(config.router.queue_length_limit)),
        streaming: Arc::new(StreamingDispatcher::new()),
        retry_config: config.router.retry,
        burst_config: config.router.burst,
        results: Arc::new(DashMap::new()),
        shutting_down: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        in_flight: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
    })
}

/// Spawn the orchestrator's worker pool, the streaming dispatcher's
/// heartbeat/eviction loop, and the capacity manager's periodic health
/// sweep. Detached: shutdown is driven by `main` observing the drain
/// deadline, not by these handles directly.
fn spawn_router_background_tasks(services: Arc<Services>, config: &Config) {
    orchestrator::spawn_workers(
        services.clone(),
        config.router.batch_size,
        config.router.max_concurrent,
        config.router.processing_interval,
    );
    crate::streaming::spawn_maintenance_loop(services.streaming.clone());

    let capacity = services.capacity.clone();
    let rate_limiter = services.rate_limiter.clone();
    let interval = config.router.monitoring_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            for provider_id in capacity.registered_providers() {
                match capacity.sweep_health(&provider_id) {
                    Ok(_) => evaluate_capacity_alerts(&capacity, &provider_id),
                    Err(err) => tracing::warn!(%provider_id, %err, "health sweep failed"),
                }
            }
            for user_id in rate_limiter.tracked_users() {
                evaluate_rate_limit_alert(&rate_limiter, &user_id);
            }

            let aggregated = crate::metrics::get_aggregated_metrics().await;
            for (provider_id, provider_metrics) in &aggregated.provider_stats {
                evaluate_provider_metric_alerts(provider_id, provider_metrics);
            }
        }
    });
}

/// Raises (or resolves) `warningUtilization`/`criticalUtilization` alerts
/// off the snapshot a health sweep just produced. Critical takes
/// precedence: once utilization clears critical but is still above
/// warning, the warning alert is re-raised on the next tick since
/// `sweep_health` runs on every monitoring interval anyway.
fn evaluate_capacity_alerts(capacity: &CapacityManager, provider_id: &str) {
    let Some(snapshot) = capacity.snapshot(provider_id) else {
        return;
    };
    let Some(limits) = capacity.limits(provider_id) else {
        return;
    };
    let max_concurrent = limits.max_concurrent.max(1) as f64;
    let utilization = (snapshot.active_requests + snapshot.reserved_requests) as f64 / max_concurrent;

    crate::metrics::evaluate_threshold(
        provider_id,
        crate::metrics::AlertMetric::CapacityUtilization,
        utilization,
        0.9,
        true,
        format!("capacity utilization {:.1}% exceeds 90%", utilization * 100.0),
    );
    crate::metrics::evaluate_threshold(
        provider_id,
        crate::metrics::AlertMetric::CriticalUtilization,
        utilization,
        limits.critical_utilization,
        true,
        format!("concurrent utilization {:.1}% exceeds critical threshold", utilization * 100.0),
    );
    if utilization <= limits.critical_utilization {
        crate::metrics::evaluate_threshold(
            provider_id,
            crate::metrics::AlertMetric::WarningUtilization,
            utilization,
            limits.warning_utilization,
            true,
            format!("concurrent utilization {:.1}% exceeds warning threshold", utilization * 100.0),
        );
    } else {
        // Critical already covers this provider; avoid reporting both at once.
        crate::metrics::resolve_alert(provider_id, crate::metrics::AlertMetric::WarningUtilization);
    }
}

/// Raises (or resolves) the success-rate and p95-latency alerts off the
/// rolling per-provider metrics the request path already records.
fn evaluate_provider_metric_alerts(provider_id: &str, metrics: &crate::metrics::ProviderMetrics) {
    if metrics.requests == 0 {
        return;
    }
    let success_rate = metrics.successful_requests as f64 / metrics.requests as f64;
    crate::metrics::evaluate_threshold(
        provider_id,
        crate::metrics::AlertMetric::SuccessRate,
        success_rate,
        0.95,
        false,
        format!("success rate {:.1}% below threshold", success_rate * 100.0),
    );
    crate::metrics::evaluate_threshold(
        provider_id,
        crate::metrics::AlertMetric::P95ResponseTime,
        metrics.p95_latency_ms,
        30_000.0,
        true,
        format!("p95 response time {:.0}ms exceeds 30s", metrics.p95_latency_ms),
    );
}

/// Raises a `rateLimitWarning` alert once a user is within a small margin
/// of their tier's `requestsPerMinute`, resolving it once they fall back
/// under the margin.
fn evaluate_rate_limit_alert(rate_limiter: &SlidingWindowLimiter, user_id: &str) {
    let Some((count, limit)) = rate_limiter.usage(user_id) else {
        return;
    };
    let ratio = count as f64 / limit.max(1) as f64;
    crate::metrics::evaluate_threshold(
        user_id,
        crate::metrics::AlertMetric::RateLimitWarning,
        ratio,
        0.9,
        true,
        format!("user {user_id} at {:.0}% of per-minute rate limit", ratio * 100.0),
    );
}
