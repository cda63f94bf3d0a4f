//! SMS gateway for the SMSLeopard HTTP API.
//!
//! Layers, bottom to top:
//! - [`domain`]: strong types with validation and invariants (no I/O),
//! - [`normalizer`]: rewrites raw Kenyan numbers into `+254…` canonical form,
//! - a private transport layer for SMSLeopard wire-format quirks,
//! - [`dispatcher`]: sends with fixed-delay retry over an injectable [`HttpTransport`],
//! - [`server`]: the axum HTTP API in front of the two.
//!
//! ```rust,no_run
//! use smsgate::{Credentials, Dispatcher, MessageText, Normalizer, SendOptions, SendSms};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), smsgate::DispatchError> {
//!     let dispatcher = Dispatcher::builder()
//!         .credentials(Some(Credentials::new("key", "secret")?))
//!         .build()?;
//!     let recipients = Normalizer::default()
//!         .format(["0712345678"])
//!         .into_accepted()?;
//!     let request = SendSms::new(recipients, MessageText::new("hello")?, SendOptions::default())?;
//!     let _resp = dispatcher.send_sms(request).await?;
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod alert;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod normalizer;
pub mod server;
mod transport;

pub use alert::{Alert, AlertNotifier, AlertState, AlertThresholds, SensorReading};
pub use config::Config;
pub use dispatcher::{
    Credentials, DispatchError, Dispatcher, DispatcherBuilder, HttpTransport, RetryPolicy,
    TransportFailure,
};
pub use domain::{
    CanonicalNumber, MessageId, MessageText, SendOptions, SendSms, SendSmsResponse, SenderId,
    ValidationError,
};
pub use normalizer::{CountryRules, NormalizationResult, Normalizer};
