use serde::Deserialize;
use serde_json::{Value, json};

use super::{TransportError, TransportText};
use crate::domain::{CanonicalNumber, MessageId, MessageText, SendSms, SendSmsResponse, SenderId};

#[derive(Debug, Clone, Deserialize)]
struct SendSmsJsonResponse {
    #[serde(default, alias = "id")]
    message_id: Option<TransportText>,
    #[serde(default)]
    recipients: Vec<RecipientJsonResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct RecipientJsonResult {
    #[serde(default, alias = "message_id")]
    id: Option<TransportText>,
}

/// Build the `POST /sms/send` body.
///
/// `sender` is the already-resolved sender: the request's own, or the configured default.
pub fn encode_send_sms_payload(request: &SendSms, sender: &SenderId) -> Value {
    let destination = request
        .recipients()
        .iter()
        .map(|number| json!({ (CanonicalNumber::FIELD): number.as_str() }))
        .collect::<Vec<_>>();

    let mut payload = json!({
        (SenderId::FIELD): sender.as_str(),
        (MessageText::FIELD): request.message().as_str(),
        "destination": destination,
    });
    if let Some(schedule_time) = request.options().schedule_time.as_deref() {
        payload["schedule_time"] = Value::from(schedule_time);
    }
    payload
}

/// Decode a successful send response.
///
/// The message id is taken from `message_id` (or `id`) and falls back to the first
/// recipient's id. The whole body is kept as the raw payload.
pub fn decode_send_sms_json_response(
    json: &str,
    attempts: u32,
) -> Result<SendSmsResponse, TransportError> {
    let payload: Value = serde_json::from_str(json)?;
    let parsed: SendSmsJsonResponse = serde_json::from_str(json)?;

    let message_id = parsed
        .message_id
        .and_then(TransportText::into_non_blank)
        .or_else(|| {
            parsed
                .recipients
                .into_iter()
                .find_map(|recipient| recipient.id.and_then(TransportText::into_non_blank))
        })
        .and_then(|id| MessageId::new(id).ok());

    Ok(SendSmsResponse {
        message_id,
        attempts,
        payload,
    })
}
