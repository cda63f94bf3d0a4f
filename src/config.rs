//! Configuration management for the SMS gateway.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::dispatcher::{
    Credentials, DEFAULT_BASE_URL, DEFAULT_SENDER_ID, Dispatcher, DispatcherBuilder,
};
use crate::domain::SenderId;
use crate::normalizer::{CountryRules, Normalizer};
use crate::server::DEFAULT_MAX_RETRIES_CAP;

const CONFIG_FILE: &str = "config.toml";

/// POST routes the webhook must not shadow.
const RESERVED_POST_PATHS: [&str; 2] = ["/sms/send", "/sms/validate"];

/// Gateway configuration with defaults, file, and environment overrides.
///
/// Loaded in priority order:
/// 1. Environment variables (highest priority, keys are matched case-insensitively)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Without `api_key`/`api_secret` the gateway still starts; sends then fail with a
/// configuration error instead of reaching SMSLeopard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // SMSLeopard
    /// Environment variable: `API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable: `API_SECRET`
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Base URL of the SMSLeopard v1 API.
    ///
    /// Environment variable: `API_URL`
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Sender used when a request names none.
    ///
    /// Environment variable: `DEFAULT_SENDER_ID`
    #[serde(default = "default_sender_id")]
    pub default_sender_id: String,

    // Retry
    /// Retries after the first attempt.
    ///
    /// Environment variable: `MAX_RETRIES`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Largest `max_retries` a send request may ask for.
    ///
    /// Environment variable: `MAX_RETRIES_CAP`
    #[serde(default = "default_max_retries_cap")]
    pub max_retries_cap: u32,
    /// Fixed delay between attempts in seconds.
    ///
    /// Environment variable: `RETRY_DELAY_SECS` or `RETRY_DELAY`
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Per-attempt HTTP timeout for provider calls in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_SECS`
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // Numbers
    /// Country calling code prepended to national numbers, digits only.
    ///
    /// Environment variable: `COUNTRY_CODE`
    #[serde(default = "default_country_code")]
    pub country_code: String,

    // Server
    /// Environment variable: `HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Environment variable: `PORT`
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path that receives SMSLeopard delivery reports.
    ///
    /// Environment variable: `WEBHOOK_ENDPOINT`
    #[serde(default = "default_webhook_endpoint")]
    pub webhook_endpoint: String,

    // Logging
    /// Environment variable: `RUST_LOG` or `LOG_LEVEL`
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, `config.toml` and the environment, then validate it.
    pub fn load() -> Result<Self> {
        let figment = Self::figment()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("").map(|key| {
                match key.as_str().to_ascii_lowercase().as_str() {
                    "retry_delay" => "retry_delay_secs".into(),
                    "log_level" => "rust_log".into(),
                    other => other.to_owned().into(),
                }
            }));
        Self::from_figment(figment)
    }

    /// Figment seeded with the built-in defaults, for layering further providers.
    pub fn figment() -> Figment {
        Figment::new().merge(Serialized::defaults(Self::default()))
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Credentials when both halves are set and non-blank.
    pub fn credentials(&self) -> Option<Credentials> {
        let key = self.api_key.as_deref()?;
        let secret = self.api_secret.as_deref()?;
        Credentials::new(key, secret).ok()
    }

    /// `retry_delay_secs` as a [`Duration`].
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// `request_timeout_secs` as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Dispatcher builder preloaded with this configuration.
    ///
    /// Callers can still swap the transport before building.
    pub fn to_dispatcher_builder(&self) -> Result<DispatcherBuilder> {
        let sender =
            SenderId::new(self.default_sender_id.as_str()).context("Invalid default_sender_id")?;
        Ok(Dispatcher::builder()
            .credentials(self.credentials())
            .base_url(self.api_url.as_str())
            .default_sender(sender)
            .max_retries(self.max_retries)
            .retry_delay(self.retry_delay())
            .timeout(self.request_timeout())
            .user_agent(concat!("smsgate/", env!("CARGO_PKG_VERSION"))))
    }

    /// Dispatcher over the default reqwest transport.
    pub fn to_dispatcher(&self) -> Result<Dispatcher> {
        self.to_dispatcher_builder()?
            .build()
            .context("Failed to build SMS dispatcher")
    }

    /// Normalizer for the configured country code.
    pub fn to_normalizer(&self) -> Result<Normalizer> {
        let rules = CountryRules::with_country_code(self.country_code.as_str())
            .context("Invalid country_code")?;
        Ok(Normalizer::new(rules))
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            anyhow::bail!("api_url must not be empty");
        }

        if self.default_sender_id.trim().is_empty() {
            anyhow::bail!("default_sender_id must not be empty");
        }

        if self.country_code.is_empty() || !self.country_code.bytes().all(|b| b.is_ascii_digit())
        {
            anyhow::bail!("country_code must be a non-empty string of digits");
        }

        if !self.webhook_endpoint.starts_with('/') {
            anyhow::bail!("webhook_endpoint must start with '/'");
        }

        if self.webhook_endpoint.contains(['{', '}', '*'])
            || self.webhook_endpoint.split('/').any(|segment| segment.starts_with(':'))
        {
            anyhow::bail!(
                "webhook_endpoint {} must be a literal path without route parameters",
                self.webhook_endpoint
            );
        }

        if RESERVED_POST_PATHS.contains(&self.webhook_endpoint.as_str()) {
            anyhow::bail!("webhook_endpoint {} is already routed", self.webhook_endpoint);
        }

        if self.max_retries > self.max_retries_cap {
            anyhow::bail!(
                "max_retries ({}) must not exceed max_retries_cap ({})",
                self.max_retries,
                self.max_retries_cap
            );
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            api_url: default_api_url(),
            default_sender_id: default_sender_id(),
            max_retries: default_max_retries(),
            max_retries_cap: default_max_retries_cap(),
            retry_delay_secs: default_retry_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            country_code: default_country_code(),
            host: default_host(),
            port: default_port(),
            webhook_endpoint: default_webhook_endpoint(),
            rust_log: default_log_level(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_sender_id() -> String {
    DEFAULT_SENDER_ID.to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_retries_cap() -> u32 {
    DEFAULT_MAX_RETRIES_CAP
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_country_code() -> String {
    "254".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_webhook_endpoint() -> String {
    "/dr".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
