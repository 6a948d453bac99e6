//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener
//! - Dispatch every request to the task route table
//! - Stop on signal or fatal storage error

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::http::request::{parse_body, parse_query, request_id, X_REQUEST_ID};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::routing::PatternError;
use crate::store::Store;
use crate::tasks::{self, ApiError, TaskRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<TaskRouter>,
    pub store: Arc<Mutex<Store>>,
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(store: Store, shutdown: Shutdown) -> Result<Self, PatternError> {
        Ok(Self {
            routes: Arc::new(tasks::routes()?),
            store: Arc::new(Mutex::new(store)),
            shutdown,
        })
    }
}

/// HTTP server for the task API.
pub struct HttpServer {
    router: Router,
    config: ApiConfig,
}

impl HttpServer {
    /// Create a new HTTP server over an opened store.
    pub fn new(config: ApiConfig, store: Store, shutdown: Shutdown) -> Result<Self, PatternError> {
        let state = AppState::new(store, shutdown)?;
        let router = build_router(&config, state);
        Ok(Self { router, config })
    }

    /// The Axum router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a termination signal or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ApiConfig, state: AppState) -> Router {
    Router::new()
        .route("/", any(dispatch_handler))
        .route("/{*path}", any(dispatch_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
}

/// Catch-all handler: hands the request to the task route table.
async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);
    let path = uri.path().to_string();
    let query = parse_query(uri.query());
    let body = parse_body(&body);
    let route = route_label(&state.routes, &method, &path);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        route = %route,
        "Dispatching request"
    );

    // The store lock is held for the whole handler, including the disk write.
    let worker = state.clone();
    let worker_method = method.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut store = worker.store.lock().expect("store mutex poisoned");
        worker
            .routes
            .dispatch(&mut store, &worker_method, &path, query, body)
    })
    .await;

    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => handler_error(&state, &request_id, err),
        Err(e) => {
            // A panic leaves the store mutex poisoned; no later request could use it.
            tracing::error!(request_id = %request_id, error = %e, "Handler panicked, shutting down");
            state.shutdown.trigger_fatal();
            metrics::record_request(method.as_str(), &route, 500, start);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        status = response.status.as_u16(),
        "Request handled"
    );
    metrics::record_request(method.as_str(), &route, response.status.as_u16(), start);
    response.into_response()
}

/// Metric label for a request: the matched route pattern, or `unmatched`.
fn route_label(routes: &TaskRouter, method: &Method, path: &str) -> String {
    routes
        .lookup(method, path)
        .map(|(pattern, _)| pattern.to_string())
        .unwrap_or_else(|| metrics::UNMATCHED_ROUTE.to_string())
}

fn handler_error(state: &AppState, request_id: &str, err: ApiError) -> crate::routing::Response {
    if err.is_fatal() {
        tracing::error!(
            request_id = %request_id,
            error = %err,
            "Storage failure, shutting down"
        );
        state.shutdown.trigger_fatal();
    } else {
        tracing::debug!(request_id = %request_id, error = %err, "Request rejected");
    }
    err.to_response()
}

/// Wait for a termination signal or an internal shutdown trigger.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    tokio::select! {
        _ = signals::wait_for_termination() => {}
        _ = shutdown.recv() => {}
    }
    tracing::info!("Shutdown signal received");
}
