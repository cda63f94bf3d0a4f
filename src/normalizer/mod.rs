//! Phone-number normalization for a single target country.
//!
//! Two layers with different strictness:
//! - [`validate`] is a country-agnostic sanity check (`+`, 10..=15 digits, no leading zero),
//! - [`Normalizer::format`] rewrites raw input with the country's rules and then runs
//!   [`validate`] on the rewritten candidate.
//!
//! Raw input is reduced to its ASCII digits before any rule is tried, so `"abc123def"` is
//! judged as `"123"` and `"+254 712-345-678"` as `"254712345678"`. Garbage mixed into an
//! otherwise valid-length digit run is therefore normalized, not rejected.

use tracing::debug;

use crate::domain::{CanonicalNumber, ValidationError};

const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 15;

/// Returns `true` if `number` is `+`? followed by 10..=15 ASCII digits, the first non-zero.
pub fn validate(number: &str) -> bool {
    let digits = number.strip_prefix('+').unwrap_or(number);
    (MIN_DIGITS..=MAX_DIGITS).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0')
}

/// Hide all but the last four characters, keeping a leading `+`.
pub fn mask(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    match number.strip_prefix('+') {
        Some(_) => format!("+{}{visible}", "*".repeat(chars.len() - 5)),
        None => format!("{}{visible}", "*".repeat(chars.len() - 4)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Numbering-plan facts for the target country.
///
/// Defaults to Kenya: calling code `254`, trunk prefix `0`, nine subscriber digits, and the
/// `7` and `1` leading-digit families.
pub struct CountryRules {
    country_code: String,
    national_prefix: char,
    subscriber_len: usize,
    leading_digits: Vec<char>,
}

impl CountryRules {
    /// Validated rules. A leading `+` on the calling code is dropped.
    pub fn new(
        country_code: impl Into<String>,
        national_prefix: char,
        subscriber_len: usize,
        leading_digits: Vec<char>,
    ) -> Result<Self, ValidationError> {
        let country_code = country_code.into().trim().trim_start_matches('+').to_owned();
        if country_code.is_empty()
            || !country_code.bytes().all(|b| b.is_ascii_digit())
            || country_code.starts_with('0')
        {
            return Err(ValidationError::InvalidCountryRules {
                reason: "country code must be digits without a leading zero",
            });
        }
        if !national_prefix.is_ascii_digit() {
            return Err(ValidationError::InvalidCountryRules {
                reason: "national prefix must be a digit",
            });
        }
        if subscriber_len == 0 {
            return Err(ValidationError::InvalidCountryRules {
                reason: "subscriber length must be positive",
            });
        }
        if leading_digits.iter().any(|digit| !digit.is_ascii_digit()) {
            return Err(ValidationError::InvalidCountryRules {
                reason: "leading digits must be digits",
            });
        }
        Ok(Self {
            country_code,
            national_prefix,
            subscriber_len,
            leading_digits,
        })
    }

    /// `254`, trunk prefix `0`, nine subscriber digits, leading `7` or `1`.
    pub fn kenya() -> Self {
        Self {
            country_code: "254".to_owned(),
            national_prefix: '0',
            subscriber_len: 9,
            leading_digits: vec!['7', '1'],
        }
    }

    /// Kenya's plan with a different calling code.
    pub fn with_country_code(country_code: impl Into<String>) -> Result<Self, ValidationError> {
        let kenya = Self::kenya();
        Self::new(
            country_code,
            kenya.national_prefix,
            kenya.subscriber_len,
            kenya.leading_digits,
        )
    }

    /// Calling code without the `+`.
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Digits after the calling code in a canonical number.
    pub fn subscriber_len(&self) -> usize {
        self.subscriber_len
    }
}

impl Default for CountryRules {
    fn default() -> Self {
        Self::kenya()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// `0` + subscriber: swap the trunk prefix for the country code.
    NationalPrefix,
    /// Bare subscriber digits.
    BareSubscriber,
    /// Country code + subscriber, left as is.
    AlreadyCanonical,
    /// Subscriber of a known leading-digit family. Shadowed by `BareSubscriber` in the
    /// default chain.
    LeadingDigit(char),
    /// Country code + subscriber + one stray digit: keep the canonical-length prefix.
    DoubledCountryCode,
}

impl Rule {
    fn apply(self, rules: &CountryRules, digits: &str) -> Option<String> {
        let cc = rules.country_code.as_str();
        let sub = rules.subscriber_len;
        match self {
            Self::NationalPrefix => digits
                .strip_prefix(rules.national_prefix)
                .filter(|_| digits.len() == sub + 1)
                .map(|rest| format!("{cc}{rest}")),
            Self::BareSubscriber => (digits.len() == sub).then(|| format!("{cc}{digits}")),
            Self::AlreadyCanonical => {
                (digits.starts_with(cc) && digits.len() == cc.len() + sub)
                    .then(|| digits.to_owned())
            }
            Self::LeadingDigit(lead) => {
                (digits.starts_with(lead) && digits.len() == sub).then(|| format!("{cc}{digits}"))
            }
            Self::DoubledCountryCode => (digits.starts_with(cc)
                && digits.len() == cc.len() + sub + 1)
                .then(|| digits[..cc.len() + sub].to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Outcome of [`Normalizer::format`].
///
/// Invariant: `accepted.len() + rejected.len()` equals the number of inputs. Both lists keep
/// input order and duplicates.
pub struct NormalizationResult {
    pub accepted: Vec<CanonicalNumber>,
    /// Original raw inputs, untouched.
    pub rejected: Vec<String>,
}

impl NormalizationResult {
    pub fn len(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail with [`ValidationError::NoValidPhoneNumbers`] when nothing was accepted.
    pub fn into_accepted(self) -> Result<Vec<CanonicalNumber>, ValidationError> {
        if self.accepted.is_empty() {
            return Err(ValidationError::NoValidPhoneNumbers {
                rejected: self.rejected,
            });
        }
        Ok(self.accepted)
    }
}

#[derive(Debug, Clone)]
/// Rewrites raw numbers into [`CanonicalNumber`]s for one target country.
pub struct Normalizer {
    rules: CountryRules,
    chain: Vec<Rule>,
}

impl Normalizer {
    /// Build the rule chain for `rules`.
    pub fn new(rules: CountryRules) -> Self {
        let mut chain = vec![
            Rule::NationalPrefix,
            Rule::BareSubscriber,
            Rule::AlreadyCanonical,
        ];
        chain.extend(rules.leading_digits.iter().copied().map(Rule::LeadingDigit));
        chain.push(Rule::DoubledCountryCode);
        Self { rules, chain }
    }

    /// Rules this normalizer was built with.
    pub fn rules(&self) -> &CountryRules {
        &self.rules
    }

    /// Normalize a single raw number.
    pub fn normalize(&self, raw: &str) -> Result<CanonicalNumber, ValidationError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let candidate = self
            .chain
            .iter()
            .find_map(|rule| rule.apply(&self.rules, &digits))
            .unwrap_or(digits);

        let canonical = format!("+{candidate}");
        if validate(&canonical) {
            Ok(CanonicalNumber::from_validated(canonical))
        } else {
            Err(ValidationError::InvalidPhoneNumber {
                input: raw.to_owned(),
            })
        }
    }

    /// Normalize a batch, splitting it into accepted and rejected inputs.
    pub fn format<I, S>(&self, numbers: I) -> NormalizationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = NormalizationResult::default();
        for raw in numbers {
            let raw = raw.as_ref();
            match self.normalize(raw) {
                Ok(number) => result.accepted.push(number),
                Err(_) => result.rejected.push(raw.to_owned()),
            }
        }
        debug!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            country_code = %self.rules.country_code(),
            subscriber_len = self.rules.subscriber_len(),
            "normalized phone numbers"
        );
        result
    }

    /// Apply [`validate`] to each raw input as given, without normalizing it first.
    pub fn validate_many<'a, I>(&self, numbers: I) -> Vec<(&'a str, bool)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        numbers
            .into_iter()
            .map(|number| (number, validate(number)))
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CountryRules::default())
    }
}
