//! Dispatcher: drives delivery attempts against the provider and maps transport ↔ domain.

#[cfg(test)]
pub(crate) mod fake;
mod http;
mod retry;

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{error, info, warn};
use url::Url;

pub use http::{BoxError, BoxFuture, HttpResponse, HttpTransport, ReqwestTransport, ResponseClass};
pub use retry::{RetryDecision, RetryPolicy, RetryState};

use crate::domain::{
    ApiKey, ApiSecret, BalanceResponse, MessageId, SendSms, SendSmsResponse, SenderId,
    StatusResponse, ValidationError,
};
use crate::transport::{
    decode_balance_json_response, decode_send_sms_json_response, decode_status_json_response,
    encode_send_sms_payload,
};

pub const DEFAULT_BASE_URL: &str = "https://api.smsleopard.com/v1";
pub const DEFAULT_SENDER_ID: &str = "FruitGuard";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BODY_SNIPPET_CHARS: usize = 512;

#[derive(Debug, Clone)]
/// Basic-auth credentials for SMSLeopard.
pub struct Credentials {
    key: ApiKey,
    secret: ApiSecret,
}

impl Credentials {
    /// Both halves must be non-blank.
    pub fn new(
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            key: ApiKey::new(key)?,
            secret: ApiSecret::new(secret)?,
        })
    }

    fn authorization(&self) -> String {
        let pair = format!("{}:{}", self.key.as_str(), self.secret.as_str());
        format!("Basic {}", STANDARD.encode(pair))
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Authorization".to_owned(), self.authorization()),
            ("Content-Type".to_owned(), "application/json".to_owned()),
            ("Accept".to_owned(), "application/json".to_owned()),
        ]
    }
}

#[derive(Debug, thiserror::Error)]
/// Why a single transport call failed.
pub enum TransportFailure {
    /// DNS, TLS, connect or timeout failure; no HTTP response was received.
    #[error("network error: {0}")]
    Network(#[source] BoxError),

    /// Non-2xx response. `body` is a trimmed snippet, `None` when blank.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },
}

impl TransportFailure {
    fn from_response(response: HttpResponse) -> Self {
        let trimmed = response.body.trim();
        let body = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.chars().take(BODY_SNIPPET_CHARS).collect())
        };
        Self::HttpStatus {
            status: response.status,
            body,
        }
    }

    /// Network failures and 5xx responses are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::HttpStatus { status, .. } => {
                ResponseClass::from_status(*status) == ResponseClass::ServerError
            }
        }
    }

    fn into_error(self, attempts: u32) -> DispatchError {
        if self.is_transient() {
            DispatchError::TransientTransport {
                attempts,
                source: self,
            }
        } else {
            DispatchError::PermanentTransport {
                attempts,
                source: self,
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`Dispatcher`].
///
/// Configuration and validation errors are raised before any transport call. Transport
/// errors carry the number of attempts made and the last underlying failure.
pub enum DispatchError {
    /// Missing credentials or an unusable endpoint/client setup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// One of the domain constructors rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network or 5xx failure that persisted through every allowed attempt.
    #[error("transient transport error after {attempts} attempt(s): {source}")]
    TransientTransport {
        attempts: u32,
        source: TransportFailure,
    },

    /// 4xx-style failure; never retried.
    #[error("permanent transport error after {attempts} attempt(s): {source}")]
    PermanentTransport {
        attempts: u32,
        source: TransportFailure,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[source] BoxError),
}

impl DispatchError {
    /// Attempts made before the error, for transport errors.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::TransientTransport { attempts, .. } | Self::PermanentTransport { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    credentials: Option<Credentials>,
    base_url: String,
    default_sender: Option<SenderId>,
    retry: RetryPolicy,
    timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl DispatcherBuilder {
    /// Builder with the SMSLeopard defaults: 3 retries, 5 s apart, 30 s per attempt.
    pub fn new() -> Self {
        Self {
            credentials: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            default_sender: None,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            transport: None,
        }
    }

    /// Without credentials the dispatcher still builds, but every call fails fast with
    /// [`DispatchError::Configuration`].
    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Base URL that `sms/send`, `sms/status/{id}` and `account/balance` are joined onto.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sender used when a request does not name one. Defaults to `FruitGuard`.
    pub fn default_sender(mut self, sender: SenderId) -> Self {
        self.default_sender = Some(sender);
        self
    }

    /// Retries after the first attempt. Requests may override it per send.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Fixed pause between attempts.
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry.retry_delay = retry_delay;
        self
    }

    /// Per-attempt timeout handed to the transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the HTTP `User-Agent` header of the default reqwest transport.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Replace the reqwest transport.
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Fails with [`DispatchError::Configuration`] when the base URL cannot be joined onto.
    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        let base_url = Url::parse(&self.base_url).map_err(|err| {
            DispatchError::Configuration(format!("invalid base url {:?}: {err}", self.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DispatchError::Configuration(format!(
                "base url {:?} cannot carry a path",
                self.base_url
            )));
        }

        let default_sender = match self.default_sender {
            Some(sender) => sender,
            None => SenderId::new(DEFAULT_SENDER_ID)?,
        };

        let http = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(user_agent) = self.user_agent {
                    builder = builder.user_agent(user_agent);
                }
                let client = builder.build().map_err(|err| {
                    DispatchError::Configuration(format!("failed to build HTTP client: {err}"))
                })?;
                Arc::new(ReqwestTransport::new(client))
            }
        };

        Ok(Dispatcher {
            credentials: self.credentials,
            base_url,
            default_sender,
            retry: self.retry,
            timeout: self.timeout,
            http,
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
/// Sends SMS through SMSLeopard, retrying transient failures with a fixed delay.
///
/// Holds only read-only configuration, so one instance can serve concurrent requests. Each
/// [`Dispatcher::send_sms`] call owns its own [`RetryState`]; attempts of one request run
/// strictly one after another, and the calling task sleeps between them.
pub struct Dispatcher {
    credentials: Option<Credentials>,
    base_url: Url,
    default_sender: SenderId,
    retry: RetryPolicy,
    timeout: Duration,
    http: Arc<dyn HttpTransport>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn default_sender(&self) -> &SenderId {
        &self.default_sender
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Per-attempt transport timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send `request`, retrying network errors and 5xx responses.
    ///
    /// Makes at most `max_retries + 1` transport calls, where `max_retries` is the request's
    /// override or the configured value.
    ///
    /// Errors:
    /// - [`DispatchError::Configuration`] without credentials (no call is made),
    /// - [`DispatchError::PermanentTransport`] on the first 4xx-style response,
    /// - [`DispatchError::TransientTransport`] once every attempt failed transiently,
    /// - [`DispatchError::Parse`] when a 2xx body is not JSON.
    pub async fn send_sms(&self, request: SendSms) -> Result<SendSmsResponse, DispatchError> {
        let headers = self.auth_headers()?;
        let url = self.endpoint(&["sms", "send"])?;
        let sender = request
            .options()
            .sender
            .as_ref()
            .unwrap_or(&self.default_sender);
        let payload = encode_send_sms_payload(&request, sender);
        let mut state = RetryState::new(self.retry.with_max_retries(request.options().max_retries));

        loop {
            info!(
                attempt = state.attempts_made(),
                max_attempts = state.max_attempts(),
                recipients = request.recipients().len(),
                sender = sender.as_str(),
                "sending SMS"
            );

            let failure = match self.http.post_json(&url, &headers, &payload, self.timeout).await {
                Ok(response) if response.class() == ResponseClass::Success => {
                    let parsed =
                        decode_send_sms_json_response(&response.body, state.attempts_made())
                            .map_err(|err| DispatchError::Parse(Box::new(err)))?;
                    info!(
                        attempts = parsed.attempts,
                        message_id = parsed.message_id.as_ref().map(MessageId::as_str),
                        "SMS sent"
                    );
                    return Ok(parsed);
                }
                Ok(response) => TransportFailure::from_response(response),
                Err(err) => TransportFailure::Network(err),
            };

            if !failure.is_transient() {
                error!(
                    attempt = state.attempts_made(),
                    error = %failure,
                    "SMS send rejected, not retrying"
                );
                return Err(failure.into_error(state.attempts_made()));
            }

            match state.on_transient_failure() {
                RetryDecision::Retry {
                    next_attempt,
                    delay,
                } => {
                    warn!(
                        attempt = next_attempt,
                        error = %failure,
                        delay = ?delay,
                        "SMS send attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp { attempts } => {
                    error!(attempts, error = %failure, "SMS send failed after all retries");
                    return Err(failure.into_error(attempts));
                }
            }
        }
    }

    /// Look up delivery status for a message. Single attempt, no retry.
    pub async fn status(&self, message_id: &MessageId) -> Result<StatusResponse, DispatchError> {
        let headers = self.auth_headers()?;
        let url = self.endpoint(&["sms", "status", message_id.as_str()])?;
        let body = self.get_once(&url, &headers).await?;
        decode_status_json_response(message_id, &body)
            .map_err(|err| DispatchError::Parse(Box::new(err)))
    }

    /// Fetch the account balance. Single attempt, no retry.
    pub async fn balance(&self) -> Result<BalanceResponse, DispatchError> {
        let headers = self.auth_headers()?;
        let url = self.endpoint(&["account", "balance"])?;
        let body = self.get_once(&url, &headers).await?;
        decode_balance_json_response(&body).map_err(|err| DispatchError::Parse(Box::new(err)))
    }

    async fn get_once(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<String, DispatchError> {
        let failure = match self.http.get(url, headers, self.timeout).await {
            Ok(response) if response.class() == ResponseClass::Success => return Ok(response.body),
            Ok(response) => TransportFailure::from_response(response),
            Err(err) => TransportFailure::Network(err),
        };
        error!(url, error = %failure, "provider query failed");
        Err(failure.into_error(1))
    }

    fn auth_headers(&self) -> Result<Vec<(String, String)>, DispatchError> {
        match self.credentials.as_ref() {
            Some(credentials) => Ok(credentials.headers()),
            None => {
                warn!("SMSLeopard API key or secret not configured");
                Err(DispatchError::Configuration(
                    "SMSLeopard API key or secret not configured".to_owned(),
                ))
            }
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String, DispatchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                DispatchError::Configuration("base url cannot carry a path".to_owned())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }
}
