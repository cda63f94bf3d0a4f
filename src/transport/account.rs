use serde::Deserialize;
use serde_json::Value;

use super::TransportError;
use super::money::TransportMoney;
use crate::domain::BalanceResponse;

#[derive(Debug, Clone, Deserialize)]
struct BalanceJsonResponse {
    #[serde(default)]
    balance: Option<TransportMoney>,
    #[serde(default)]
    currency: Option<String>,
}

pub fn decode_balance_json_response(json: &str) -> Result<BalanceResponse, TransportError> {
    let payload: Value = serde_json::from_str(json)?;
    let parsed: BalanceJsonResponse = serde_json::from_str(json)?;
    Ok(BalanceResponse {
        balance: parsed.balance.map(TransportMoney::into_string),
        currency: parsed
            .currency
            .map(|currency| currency.trim().to_owned())
            .filter(|currency| !currency.is_empty()),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_balance_supports_numeric_and_string_money() {
        let numeric = r#"{ "balance": 10.50, "currency": "KES" }"#;
        let parsed = decode_balance_json_response(numeric).unwrap();
        assert_eq!(parsed.balance.as_deref(), Some("10.50"));
        assert_eq!(parsed.currency.as_deref(), Some("KES"));

        let string = r#"{ "balance": "10.50" }"#;
        let parsed = decode_balance_json_response(string).unwrap();
        assert_eq!(parsed.balance.as_deref(), Some("10.50"));
        assert_eq!(parsed.currency, None);
    }

    #[test]
    fn decode_balance_keeps_unknown_fields_in_payload() {
        let json = r#"{ "balance": null, "account": "fruitguard" }"#;
        let parsed = decode_balance_json_response(json).unwrap();
        assert_eq!(parsed.balance, None);
        assert_eq!(parsed.payload["account"], "fruitguard");
    }
}
