// SPDX-License-Identifier: Apache-2.0

use crate::{District, ParseError, ReferenceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeedbackType {
    Suggestion,
    Complaint,
    Appreciation,
    General,
}

pub const FEEDBACK_TYPES: [FeedbackType; 4] = [
    FeedbackType::Suggestion,
    FeedbackType::Complaint,
    FeedbackType::Appreciation,
    FeedbackType::General,
];

impl FeedbackType {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input {
            "Suggestion" => Ok(Self::Suggestion),
            "Complaint" => Ok(Self::Complaint),
            "Appreciation" => Ok(Self::Appreciation),
            "General" => Ok(Self::General),
            other => Err(ParseError::Unrecognized("feedbackType", other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Suggestion => "Suggestion",
            Self::Complaint => "Complaint",
            Self::Appreciation => "Appreciation",
            Self::General => "General",
        }
    }
}

impl Display for FeedbackType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for FeedbackType {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FeedbackType> for String {
    fn from(value: FeedbackType) -> Self {
        value.as_str().to_string()
    }
}

/// Triage state of a feedback item; independent of the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeedbackStatus {
    New,
    Reviewed,
    Resolved,
    Archived,
}

pub const FEEDBACK_STATUSES: [FeedbackStatus; 4] = [
    FeedbackStatus::New,
    FeedbackStatus::Reviewed,
    FeedbackStatus::Resolved,
    FeedbackStatus::Archived,
];

impl FeedbackStatus {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input {
            "New" => Ok(Self::New),
            "Reviewed" => Ok(Self::Reviewed),
            "Resolved" => Ok(Self::Resolved),
            "Archived" => Ok(Self::Archived),
            other => Err(ParseError::Unrecognized("status", other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Reviewed => "Reviewed",
            Self::Resolved => "Resolved",
            Self::Archived => "Archived",
        }
    }
}

impl Display for FeedbackStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for FeedbackStatus {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FeedbackStatus> for String {
    fn from(value: FeedbackStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: i64,
    pub reference_id: ReferenceId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub district: Option<District>,
    pub feedback_type: FeedbackType,
    pub message: String,
    pub status: FeedbackStatus,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub district: Option<District>,
    pub feedback_type: FeedbackType,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub status: Option<FeedbackStatus>,
    pub feedback_type: Option<FeedbackType>,
}
