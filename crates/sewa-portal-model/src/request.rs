// SPDX-License-Identifier: Apache-2.0

use crate::{District, ParseError, ReferenceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;
pub const LOCATION_MIN_LEN: usize = 2;
pub const LOCATION_MAX_LEN: usize = 200;
pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const DESCRIPTION_MAX_LEN: usize = 2000;
pub const GPU_MAX_LEN: usize = 100;
pub const AMENITY_MAX_LEN: usize = 100;
pub const MAX_AMENITIES: usize = 15;
pub const NOTES_MAX_LEN: usize = 1000;
pub const POPULATION_MAX: i64 = 10_000_000;

/// Urgency chosen by the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
}

pub const PRIORITIES: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

impl Priority {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(ParseError::Unrecognized("priority", other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Priority {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

/// Lifecycle state of an amenity request. Staff may move a request from any
/// state to any other state; the enum bounds the vocabulary, not the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
    Completed,
}

pub const REQUEST_STATUSES: [RequestStatus; 5] = [
    RequestStatus::Pending,
    RequestStatus::InProgress,
    RequestStatus::Approved,
    RequestStatus::Rejected,
    RequestStatus::Completed,
];

impl RequestStatus {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input {
            "Pending" => Ok(Self::Pending),
            "In Progress" => Ok(Self::InProgress),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            "Completed" => Ok(Self::Completed),
            other => Err(ParseError::Unrecognized("status", other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Completed => "Completed",
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RequestStatus> for String {
    fn from(value: RequestStatus) -> Self {
        value.as_str().to_string()
    }
}

/// A persisted amenity request. `id` and `submitted_at` are assigned by the
/// store; `status`, `admin_notes` and `updated_at` are mutated only by the
/// lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityRequest {
    pub id: i64,
    pub reference_id: ReferenceId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub district: District,
    pub gpu: Option<String>,
    pub location: String,
    pub amenities: Vec<String>,
    pub other_amenity: Option<String>,
    pub description: String,
    pub population: Option<i64>,
    pub priority: Priority,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A fully validated submission, ready for the store. Produced only by the
/// validation layer; field invariants hold by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub district: District,
    pub gpu: Option<String>,
    pub location: String,
    pub amenities: Vec<String>,
    pub other_amenity: Option<String>,
    pub description: String,
    pub population: Option<i64>,
    pub priority: Priority,
}

/// Optional equality filters for admin listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub district: Option<District>,
    pub priority: Option<Priority>,
}

impl RequestFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.district.is_none() && self.priority.is_none()
    }
}
