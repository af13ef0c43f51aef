// SPDX-License-Identifier: Apache-2.0

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The six administrative districts served by the portal. Submissions
/// naming anything else are rejected, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum District {
    Gangtok,
    Mangan,
    Namchi,
    Gyalshing,
    Pakyong,
    Soreng,
}

pub const DISTRICTS: [District; 6] = [
    District::Gangtok,
    District::Mangan,
    District::Namchi,
    District::Gyalshing,
    District::Pakyong,
    District::Soreng,
];

impl District {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input {
            "Gangtok" => Ok(Self::Gangtok),
            "Mangan" => Ok(Self::Mangan),
            "Namchi" => Ok(Self::Namchi),
            "Gyalshing" => Ok(Self::Gyalshing),
            "Pakyong" => Ok(Self::Pakyong),
            "Soreng" => Ok(Self::Soreng),
            other => Err(ParseError::Unrecognized("district", other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gangtok => "Gangtok",
            Self::Mangan => "Mangan",
            Self::Namchi => "Namchi",
            Self::Gyalshing => "Gyalshing",
            Self::Pakyong => "Pakyong",
            Self::Soreng => "Soreng",
        }
    }
}

impl Display for District {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for District {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<District> for String {
    fn from(value: District) -> Self {
        value.as_str().to_string()
    }
}
