// SPDX-License-Identifier: Apache-2.0

use crate::ParseError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub const REQUEST_PREFIX: &str = "SKM";
pub const FEEDBACK_PREFIX: &str = "FB";
/// Digits after the prefix: six from the clock, three random.
pub const REFERENCE_DIGITS: usize = 9;

/// Public tracking code a citizen receives for a submission. Collision
/// resistance is best-effort; the store's UNIQUE constraint is the actual
/// backstop and callers regenerate on a constraint rejection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[non_exhaustive]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Mint a fresh code: `<prefix><last 6 digits of epoch millis><3-digit random>`.
    #[must_use]
    pub fn generate(prefix: &str) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let clock_part = millis % 1_000_000;
        let random_part = rand::thread_rng().gen_range(0..1000u32);
        Self(format!("{prefix}{clock_part:06}{random_part:03}"))
    }

    /// Accepts a code as typed by a citizen; case-insensitive.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let canonical = input.trim().to_ascii_uppercase();
        if !canonical.is_ascii() {
            return Err(ParseError::InvalidFormat(
                "reference code must start with SKM or FB",
            ));
        }
        let Some(split) = canonical.len().checked_sub(REFERENCE_DIGITS) else {
            return Err(ParseError::InvalidFormat("reference code is too short"));
        };
        let (prefix, digits) = canonical.split_at(split);
        if prefix != REQUEST_PREFIX && prefix != FEEDBACK_PREFIX {
            return Err(ParseError::InvalidFormat(
                "reference code must start with SKM or FB",
            ));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidFormat(
                "reference code must end in nine digits",
            ));
        }
        Ok(Self(canonical))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_feedback(&self) -> bool {
        self.0.starts_with(FEEDBACK_PREFIX)
    }
}

impl Display for ReferenceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_request_codes_have_the_published_shape() {
        let id = ReferenceId::generate(REQUEST_PREFIX);
        assert!(id.as_str().starts_with("SKM"));
        assert_eq!(id.as_str().len(), 3 + REFERENCE_DIGITS);
        assert!(id.as_str()[3..].bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn parse_is_case_insensitive() {
        let id = ReferenceId::parse("skm123456789").expect("lowercase accepted");
        assert_eq!(id.as_str(), "SKM123456789");
    }

    #[test]
    fn parse_rejects_foreign_prefixes_and_short_codes() {
        assert!(ReferenceId::parse("ABC123456789").is_err());
        assert!(ReferenceId::parse("SKM12345").is_err());
        assert!(ReferenceId::parse("SKM12345678X").is_err());
    }

    #[test]
    fn feedback_codes_are_distinguishable() {
        let id = ReferenceId::parse("fb123456789").expect("feedback code");
        assert!(id.is_feedback());
    }
}
