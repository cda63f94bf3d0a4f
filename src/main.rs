//! SMS gateway service.
//!
//! Loads configuration, initializes logging and serves the HTTP API until shutdown.

use anyhow::{Context, Result};
use smsgate::Config;
use smsgate::server::{self, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.rust_log);

    let addr = config.parse_server_addr()?;
    let dispatcher = config.to_dispatcher()?;
    let normalizer = config.to_normalizer()?;

    info!(
        api_url = %config.api_url,
        default_sender_id = %config.default_sender_id,
        max_retries = config.max_retries,
        max_retries_cap = config.max_retries_cap,
        retry_delay_secs = config.retry_delay_secs,
        country_code = normalizer.rules().country_code(),
        "Configuration loaded"
    );
    if !dispatcher.has_credentials() {
        warn!("api_key/api_secret not set; SMS requests will be rejected");
    }

    server::start_server(
        AppState::new(dispatcher, normalizer).with_max_retries_cap(config.max_retries_cap),
        &config.webhook_endpoint,
        addr,
    )
    .await
    .context("HTTP server failed")?;

    info!("SMS gateway shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_filter: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
