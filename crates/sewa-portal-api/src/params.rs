// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiError;
use sewa_portal_model::{
    District, FeedbackFilter, FeedbackStatus, FeedbackType, Priority, RequestFilter, RequestStatus,
};
use std::collections::BTreeMap;

pub const MAX_RECENT: usize = 50;
const DEFAULT_RECENT: usize = 10;

/// Admin listing filters; unknown values are rejected, never treated as
/// "match nothing".
pub fn parse_request_filter(query: &BTreeMap<String, String>) -> Result<RequestFilter, ApiError> {
    let status = match query.get("status") {
        Some(raw) => {
            Some(RequestStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?)
        }
        None => None,
    };
    let district = match query.get("district") {
        Some(raw) => {
            Some(District::parse(raw).map_err(|_| ApiError::invalid_param("district", raw))?)
        }
        None => None,
    };
    let priority = match query.get("priority") {
        Some(raw) => {
            Some(Priority::parse(raw).map_err(|_| ApiError::invalid_param("priority", raw))?)
        }
        None => None,
    };
    Ok(RequestFilter {
        status,
        district,
        priority,
    })
}

pub fn parse_feedback_filter(query: &BTreeMap<String, String>) -> Result<FeedbackFilter, ApiError> {
    let status = match query.get("status") {
        Some(raw) => {
            Some(FeedbackStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?)
        }
        None => None,
    };
    let feedback_type = match query.get("type") {
        Some(raw) => {
            Some(FeedbackType::parse(raw).map_err(|_| ApiError::invalid_param("type", raw))?)
        }
        None => None,
    };
    Ok(FeedbackFilter {
        status,
        feedback_type,
    })
}

/// `limit` for the public recent feed, defaulted and clamped to 1..=MAX_RECENT.
pub fn parse_recent_limit(query: &BTreeMap<String, String>) -> Result<usize, ApiError> {
    match query.get("limit") {
        Some(raw) => {
            let value = raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_param("limit", raw))?;
            if value == 0 {
                return Err(ApiError::invalid_param("limit", raw));
            }
            Ok(value.min(MAX_RECENT))
        }
        None => Ok(DEFAULT_RECENT),
    }
}
