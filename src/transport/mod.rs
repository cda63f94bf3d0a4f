//! Transport layer: SMSLeopard wire-format details (serialization/deserialization).

mod account;
mod check_status;
mod money;
mod send_sms;

use serde::Deserialize;

pub use account::decode_balance_json_response;
pub use check_status::decode_status_json_response;
pub use send_sms::{decode_send_sms_json_response, encode_send_sms_payload};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identifier or label that the provider sends as either a JSON string or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TransportText {
    String(String),
    Number(serde_json::Number),
}

impl TransportText {
    fn into_string(self) -> String {
        match self {
            Self::String(value) => value,
            Self::Number(value) => value.to_string(),
        }
    }

    /// `None` for blank strings.
    fn into_non_blank(self) -> Option<String> {
        let value = self.into_string();
        if value.trim().is_empty() {
            None
        } else {
            Some(value.trim().to_owned())
        }
    }
}
