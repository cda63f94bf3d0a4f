use serde::Serialize;

use crate::domain::value::MessageId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendSmsResponse {
    pub message_id: Option<MessageId>,
    /// Transport calls made, including the successful one.
    pub attempts: u32,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub message_id: MessageId,
    pub status: Option<String>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceResponse {
    /// Kept as the provider's token so `10.00` does not become `10.0`.
    pub balance: Option<String>,
    pub currency: Option<String>,
    pub payload: serde_json::Value,
}
