// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sewa_portal_model::{
    AmenityRequest, District, FeedbackItem, FeedbackStatus, FeedbackType, Priority, ReferenceId,
    RequestStatus,
};

/// Returned to the submitter immediately after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SubmitReceiptDto {
    pub reference_id: ReferenceId,
    pub id: i64,
}

/// Public self-service view: contact details are withheld entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TrackViewDto {
    pub reference_id: ReferenceId,
    pub district: District,
    pub location: String,
    pub amenities: Vec<String>,
    pub priority: Priority,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TrackViewDto {
    #[must_use]
    pub fn from_record(record: &AmenityRequest) -> Self {
        Self {
            reference_id: record.reference_id.clone(),
            district: record.district,
            location: record.location.clone(),
            amenities: record.amenities.clone(),
            priority: record.priority,
            status: record.status,
            admin_notes: record.admin_notes.clone(),
            submitted_at: record.submitted_at,
            updated_at: record.updated_at,
        }
    }
}

/// Listing row for the public recent/district feeds; submitter reduced to
/// first name plus initial, contact fields absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PublicRequestDto {
    pub reference_id: ReferenceId,
    pub submitter: String,
    pub district: District,
    pub location: String,
    pub amenities: Vec<String>,
    pub priority: Priority,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
}

impl PublicRequestDto {
    #[must_use]
    pub fn from_record(record: &AmenityRequest) -> Self {
        Self {
            reference_id: record.reference_id.clone(),
            submitter: redact_name(&record.name),
            district: record.district,
            location: record.location.clone(),
            amenities: record.amenities.clone(),
            priority: record.priority,
            status: record.status,
            submitted_at: record.submitted_at,
        }
    }
}

/// "Anita Rai" becomes "Anita R."; a single bare name passes through.
#[must_use]
pub(crate) fn redact_name(full: &str) -> String {
    let mut parts = full.split_whitespace();
    let first = parts.next().unwrap_or_default();
    match parts.next().and_then(|rest| rest.chars().next()) {
        Some(initial) => format!("{first} {initial}."),
        None => first.to_string(),
    }
}

/// Public self-service view of a feedback item; submitter contact withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FeedbackTrackDto {
    pub reference_id: ReferenceId,
    pub feedback_type: FeedbackType,
    pub status: FeedbackStatus,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FeedbackTrackDto {
    #[must_use]
    pub fn from_record(record: &FeedbackItem) -> Self {
        Self {
            reference_id: record.reference_id.clone(),
            feedback_type: record.feedback_type,
            status: record.status,
            admin_notes: record.admin_notes.clone(),
            submitted_at: record.submitted_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StatusCountDto {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StatsDto {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub by_district: Vec<StatusCountDto>,
    pub by_priority: Vec<StatusCountDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DistrictOverviewDto {
    pub district: District,
    pub requests: Vec<PublicRequestDto>,
    pub stats: StatsDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LoginResponseDto {
    pub token: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_redaction_keeps_first_name_and_initial_only() {
        assert_eq!(redact_name("Anita Rai"), "Anita R.");
        assert_eq!(redact_name("Tashi Wangdi Bhutia"), "Tashi W.");
        assert_eq!(redact_name("Pema"), "Pema");
        assert_eq!(redact_name("  "), "");
    }
}
