//! HTTP server: routing, middleware and graceful shutdown.
//!
//! Requests flow through `TraceLayer`, then into the handlers in [`handlers`]. Single-attempt
//! routes also sit behind a `TimeoutLayer`. `/sms/send` does not: a retry sequence is never cut
//! short, and its length is bounded by the per-attempt transport timeout and the retry cap.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::ApiError;

use crate::dispatcher::Dispatcher;
use crate::normalizer::Normalizer;

const TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Largest `max_retries` a send request may ask for unless configured otherwise.
pub const DEFAULT_MAX_RETRIES_CAP: u32 = 10;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub normalizer: Arc<Normalizer>,
    /// Upper bound for a request's `max_retries` override.
    pub max_retries_cap: u32,
}

impl AppState {
    /// State with the default retry cap.
    pub fn new(dispatcher: Dispatcher, normalizer: Normalizer) -> Self {
        Self {
            dispatcher,
            normalizer: Arc::new(normalizer),
            max_retries_cap: DEFAULT_MAX_RETRIES_CAP,
        }
    }

    /// Replace the upper bound for per-request `max_retries`.
    pub fn with_max_retries_cap(mut self, cap: u32) -> Self {
        self.max_retries_cap = cap;
        self
    }

    /// Deadline for routes that make at most one provider call.
    fn query_budget(&self) -> Duration {
        self.dispatcher.timeout().saturating_add(TIMEOUT_SLACK)
    }
}

/// Creates the router with all routes and middleware.
///
/// `webhook_endpoint` is the path SMSLeopard posts delivery reports to and must start with `/`.
pub fn create_router(state: AppState, webhook_endpoint: &str) -> Router {
    let queries = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/sms/status/{message_id}", get(handlers::sms_status))
        .route("/sms/validate", post(handlers::validate_numbers))
        .route("/account/balance", get(handlers::balance))
        .route(webhook_endpoint, post(handlers::delivery_report))
        .layer(TimeoutLayer::new(state.query_budget()));

    Router::new()
        .route("/sms/send", post(handlers::send_sms))
        .merge(queries)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until CTRL+C or SIGTERM.
pub async fn start_server(
    state: AppState,
    webhook_endpoint: &str,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let app = create_router(state, webhook_endpoint);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!(%actual_addr, webhook_endpoint, "SMS gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SMS gateway stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}
