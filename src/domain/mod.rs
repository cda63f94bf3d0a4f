//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod validation;
mod value;

pub use request::{SendOptions, SendSms, SendSmsInput};
pub use response::{BalanceResponse, SendSmsResponse, StatusResponse};
pub use validation::ValidationError;
pub use value::{ApiKey, ApiSecret, CanonicalNumber, MessageId, MessageText, SenderId};
