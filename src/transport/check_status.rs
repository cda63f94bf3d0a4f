use serde::Deserialize;
use serde_json::Value;

use super::{TransportError, TransportText};
use crate::domain::{MessageId, StatusResponse};

#[derive(Debug, Clone, Deserialize)]
struct StatusJsonResponse {
    #[serde(default, alias = "delivery_status")]
    status: Option<TransportText>,
}

pub fn decode_status_json_response(
    message_id: &MessageId,
    json: &str,
) -> Result<StatusResponse, TransportError> {
    let payload: Value = serde_json::from_str(json)?;
    let parsed: StatusJsonResponse = serde_json::from_str(json)?;
    Ok(StatusResponse {
        message_id: message_id.clone(),
        status: parsed.status.and_then(TransportText::into_non_blank),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_status_echoes_message_id_and_status() {
        let id = MessageId::new("abc123").unwrap();
        let json = r#"{ "message_id": "abc123", "status": "delivered" }"#;

        let response = decode_status_json_response(&id, json).unwrap();
        assert_eq!(response.message_id, id);
        assert_eq!(response.status.as_deref(), Some("delivered"));
        assert_eq!(response.payload["status"], "delivered");
    }

    #[test]
    fn decode_status_accepts_delivery_status_alias_and_numbers() {
        let id = MessageId::new("abc123").unwrap();

        let response = decode_status_json_response(&id, r#"{ "delivery_status": 3 }"#).unwrap();
        assert_eq!(response.status.as_deref(), Some("3"));

        let response = decode_status_json_response(&id, "{}").unwrap();
        assert_eq!(response.status, None);
    }

    #[test]
    fn decode_status_rejects_non_json() {
        let id = MessageId::new("abc123").unwrap();
        assert!(decode_status_json_response(&id, "oops").is_err());
    }
}
