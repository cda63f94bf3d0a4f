use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    InvalidPhoneNumber { input: String },
    NoValidPhoneNumbers { rejected: Vec<String> },
    InvalidCountryRules { reason: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidPhoneNumber { input } => write!(f, "invalid phone number: {input}"),
            Self::NoValidPhoneNumbers { rejected } => {
                write!(
                    f,
                    "no valid phone numbers provided ({} rejected)",
                    rejected.len()
                )
            }
            Self::InvalidCountryRules { reason } => write!(f, "invalid country rules: {reason}"),
        }
    }
}

impl std::error::Error for ValidationError {}
