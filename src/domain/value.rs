use serde::Serialize;

use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMSLeopard API key (the user half of the Basic credentials).
///
/// Invariant: non-empty after trimming.
pub struct ApiKey(String);

impl ApiKey {
    /// Configuration field name (`api_key`).
    pub const FIELD: &'static str = "api_key";

    /// Create a validated [`ApiKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// SMSLeopard API secret.
///
/// Invariant: must not be empty (whitespace is preserved and allowed).
pub struct ApiSecret(String);

impl ApiSecret {
    /// Configuration field name (`api_secret`).
    pub const FIELD: &'static str = "api_secret";

    /// Create a validated [`ApiSecret`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the secret as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiSecret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
/// Provider-registered sender identity (`source`).
///
/// Invariant: non-empty after trimming. The value must be enabled on the provider account.
pub struct SenderId(String);

impl SenderId {
    /// Wire field name used by SMSLeopard (`source`).
    pub const FIELD: &'static str = "source";

    /// Create a validated [`SenderId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated sender id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
/// SMS message body (`message`).
///
/// Invariant: non-empty after trimming. The original value (including whitespace) is preserved.
pub struct MessageText(String);

impl MessageText {
    /// Wire field name used by SMSLeopard (`message`).
    pub const FIELD: &'static str = "message";

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
/// Provider-assigned message id, used for status lookups.
///
/// Invariant: non-empty after trimming.
pub struct MessageId(String);

impl MessageId {
    /// Wire field name used by SMSLeopard (`message_id`).
    pub const FIELD: &'static str = "message_id";

    /// Create a validated [`MessageId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated message id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
/// Destination number in `+<country code><subscriber>` form.
///
/// Only the [`Normalizer`](crate::normalizer::Normalizer) creates values of this type, so every
/// instance has passed the syntactic validation predicate.
pub struct CanonicalNumber(String);

impl CanonicalNumber {
    /// Wire field name used inside each `destination` entry (`number`).
    pub const FIELD: &'static str = "number";

    pub(crate) fn from_validated(value: String) -> Self {
        Self(value)
    }

    /// Borrow the canonical form, including the leading `+`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_newtypes_trim_or_validate() {
        let key = ApiKey::new("  key ").unwrap();
        assert_eq!(key.as_str(), "key");
        assert!(ApiKey::new("  ").is_err());

        let secret = ApiSecret::new(" secret ").unwrap();
        assert_eq!(secret.as_str(), " secret ");
        assert!(ApiSecret::new("").is_err());

        let sender = SenderId::new(" FruitGuard ").unwrap();
        assert_eq!(sender.as_str(), "FruitGuard");
        assert!(SenderId::new("\t").is_err());

        let msg = MessageText::new(" hi ").unwrap();
        assert_eq!(msg.as_str(), " hi ");
        assert!(MessageText::new("  ").is_err());

        let id = MessageId::new(" abc-123 ").unwrap();
        assert_eq!(id.as_str(), "abc-123");
        assert!(MessageId::new("").is_err());
    }

    #[test]
    fn api_secret_debug_is_redacted() {
        let secret = ApiSecret::new("hunter2").unwrap();
        assert_eq!(format!("{secret:?}"), "ApiSecret(***)");
    }

    #[test]
    fn canonical_number_serializes_as_plain_string() {
        let number = CanonicalNumber::from_validated("+254712345678".to_owned());
        assert_eq!(
            serde_json::to_string(&number).unwrap(),
            "\"+254712345678\""
        );
        assert_eq!(number.to_string(), "+254712345678");
    }
}
