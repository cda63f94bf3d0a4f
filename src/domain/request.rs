use serde::Deserialize;

use crate::domain::validation::ValidationError;
use crate::domain::value::{CanonicalNumber, MessageText, SenderId};

/// A validated send request.
///
/// Invariant: at least one recipient and a non-empty message.
#[derive(Debug, Clone)]
pub struct SendSms {
    recipients: Vec<CanonicalNumber>,
    message: MessageText,
    options: SendOptions,
}

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Falls back to the dispatcher's configured default sender when `None`.
    pub sender: Option<SenderId>,
    /// Replaces the configured `max_retries` for this request only.
    pub max_retries: Option<u32>,
    /// Forwarded verbatim as `schedule_time`.
    pub schedule_time: Option<String>,
}

impl SendSms {
    pub fn new(
        recipients: Vec<CanonicalNumber>,
        message: MessageText,
        options: SendOptions,
    ) -> Result<Self, ValidationError> {
        if recipients.is_empty() {
            return Err(ValidationError::Empty {
                field: SendSmsInput::PHONE_NUMBERS_FIELD,
            });
        }
        Ok(Self {
            recipients,
            message,
            options,
        })
    }

    pub fn recipients(&self) -> &[CanonicalNumber] {
        &self.recipients
    }

    pub fn message(&self) -> &MessageText {
        &self.message
    }

    pub fn options(&self) -> &SendOptions {
        &self.options
    }
}

/// Send request as it arrives from the route layer, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct SendSmsInput {
    pub phone_numbers: Vec<String>,
    pub message: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub schedule_time: Option<String>,
}

impl SendSmsInput {
    pub const PHONE_NUMBERS_FIELD: &'static str = "phone_numbers";

    /// Validate the non-number fields into [`SendOptions`] plus message text.
    ///
    /// A blank `sender_id` is treated as absent so the configured default applies.
    pub fn split(&self) -> Result<(MessageText, SendOptions), ValidationError> {
        let message = MessageText::new(self.message.clone())?;
        let sender = match self.sender_id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(SenderId::new(raw)?),
            _ => None,
        };
        let schedule_time = self
            .schedule_time
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Ok((
            message,
            SendOptions {
                sender,
                max_retries: self.max_retries,
                schedule_time,
            },
        ))
    }
}
