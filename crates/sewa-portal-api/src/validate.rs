// SPDX-License-Identifier: Apache-2.0

//! Declarative submission validation. Every rule for every field runs before
//! anything is reported, so a form can re-render with the complete violation
//! list in one round trip.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sewa_portal_model::{
    District, FeedbackType, NewFeedback, NewRequest, Priority, AMENITY_MAX_LEN,
    DESCRIPTION_MAX_LEN, DESCRIPTION_MIN_LEN, GPU_MAX_LEN, LOCATION_MAX_LEN, LOCATION_MIN_LEN,
    MAX_AMENITIES, NAME_MAX_LEN, NAME_MIN_LEN, POPULATION_MAX,
};
use std::sync::OnceLock;

pub const EMAIL_MAX_LEN: usize = 254;
pub const MESSAGE_MIN_LEN: usize = 10;
pub const MESSAGE_MAX_LEN: usize = 2000;
const OTHER_AMENITY_MIN_LEN: usize = 2;
const OTHER_AMENITY_MAX_LEN: usize = 100;
const OTHER_LABEL: &str = "Other";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"))
}

/// One violation, surfaced verbatim in `details.field_errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Request submission exactly as deserialized from the client; nothing here
/// is trusted until `validate_request` has produced a `NewRequest`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequestSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub gpu: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub other_amenity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFeedbackSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub feedback_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(FieldError::new(
            field,
            format!("{field} must be at least {min} characters"),
        ));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
}

fn require<'a>(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match trimmed(value) {
        Some(v) => Some(v),
        None => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

fn check_email(errors: &mut Vec<FieldError>, value: &str) {
    if value.len() > EMAIL_MAX_LEN || !email_pattern().is_match(value) {
        errors.push(FieldError::new("email", "email must be a valid address"));
    }
}

/// Ten digits after stripping separators, leading digit 6-9 (Indian mobile
/// numbering).
fn check_phone(errors: &mut Vec<FieldError>, value: &str) -> Option<String> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 || !matches!(digits.as_bytes()[0], b'6'..=b'9') {
        errors.push(FieldError::new(
            "phone",
            "phone must be a 10-digit mobile number starting with 6-9",
        ));
        return None;
    }
    Some(digits)
}

fn check_amenities(
    errors: &mut Vec<FieldError>,
    raw: &Option<Vec<String>>,
) -> Option<Vec<String>> {
    let Some(list) = raw else {
        errors.push(FieldError::new("amenities", "amenities is required"));
        return None;
    };
    let cleaned: Vec<String> = list
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if cleaned.is_empty() {
        errors.push(FieldError::new(
            "amenities",
            "at least one amenity must be selected",
        ));
        return None;
    }
    if cleaned.len() > MAX_AMENITIES {
        errors.push(FieldError::new(
            "amenities",
            format!("at most {MAX_AMENITIES} amenities may be selected"),
        ));
        return None;
    }
    if let Some(long) = cleaned.iter().find(|a| a.chars().count() > AMENITY_MAX_LEN) {
        errors.push(FieldError::new(
            "amenities",
            format!("amenity label '{long}' exceeds {AMENITY_MAX_LEN} characters"),
        ));
        return None;
    }
    Some(cleaned)
}

pub fn validate_request(raw: &RawRequestSubmission) -> Result<NewRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = require(&mut errors, "name", &raw.name);
    if let Some(value) = name {
        check_length(&mut errors, "name", value, NAME_MIN_LEN, NAME_MAX_LEN);
    }

    let email = require(&mut errors, "email", &raw.email);
    if let Some(value) = email {
        check_email(&mut errors, value);
    }

    let phone = require(&mut errors, "phone", &raw.phone).and_then(|v| {
        check_phone(&mut errors, v)
    });

    let district = require(&mut errors, "district", &raw.district).and_then(|v| {
        District::parse(v)
            .map_err(|e| errors.push(FieldError::new("district", e.to_string())))
            .ok()
    });

    let gpu = trimmed(&raw.gpu).map(str::to_string);
    if let Some(value) = &gpu {
        check_length(&mut errors, "gpu", value, 1, GPU_MAX_LEN);
    }

    let location = require(&mut errors, "location", &raw.location);
    if let Some(value) = location {
        check_length(
            &mut errors,
            "location",
            value,
            LOCATION_MIN_LEN,
            LOCATION_MAX_LEN,
        );
    }

    let description = require(&mut errors, "description", &raw.description);
    if let Some(value) = description {
        check_length(
            &mut errors,
            "description",
            value,
            DESCRIPTION_MIN_LEN,
            DESCRIPTION_MAX_LEN,
        );
    }

    if let Some(value) = raw.population {
        if value < 1 || value > POPULATION_MAX {
            errors.push(FieldError::new(
                "population",
                format!("population must be between 1 and {POPULATION_MAX}"),
            ));
        }
    }

    let priority = require(&mut errors, "priority", &raw.priority).and_then(|v| {
        Priority::parse(v)
            .map_err(|e| errors.push(FieldError::new("priority", e.to_string())))
            .ok()
    });

    let amenities = check_amenities(&mut errors, &raw.amenities);

    // Cross-field rule, evaluated only once the per-field rules have spoken:
    // an "Other" selection needs its free-text companion.
    let other_amenity = trimmed(&raw.other_amenity).map(str::to_string);
    if let Some(list) = &amenities {
        if list.iter().any(|a| a == OTHER_LABEL) {
            match &other_amenity {
                None => errors.push(FieldError::new(
                    "otherAmenity",
                    "otherAmenity is required when amenities include Other",
                )),
                Some(value) => check_length(
                    &mut errors,
                    "otherAmenity",
                    value,
                    OTHER_AMENITY_MIN_LEN,
                    OTHER_AMENITY_MAX_LEN,
                ),
            }
        }
    }

    match (
        name, email, phone, district, location, description, priority, amenities,
    ) {
        (
            Some(name),
            Some(email),
            Some(phone),
            Some(district),
            Some(location),
            Some(description),
            Some(priority),
            Some(amenities),
        ) if errors.is_empty() => Ok(NewRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone,
            district,
            gpu,
            location: location.to_string(),
            amenities,
            other_amenity,
            description: description.to_string(),
            population: raw.population,
            priority,
        }),
        _ => Err(errors),
    }
}

pub fn validate_feedback(raw: &RawFeedbackSubmission) -> Result<NewFeedback, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = require(&mut errors, "name", &raw.name);
    if let Some(value) = name {
        check_length(&mut errors, "name", value, NAME_MIN_LEN, NAME_MAX_LEN);
    }

    let email = require(&mut errors, "email", &raw.email);
    if let Some(value) = email {
        check_email(&mut errors, value);
    }

    let phone = match trimmed(&raw.phone) {
        Some(value) => check_phone(&mut errors, value),
        None => None,
    };

    let district = match trimmed(&raw.district) {
        Some(value) => District::parse(value)
            .map_err(|e| errors.push(FieldError::new("district", e.to_string())))
            .ok(),
        None => None,
    };

    let feedback_type = require(&mut errors, "feedbackType", &raw.feedback_type).and_then(|v| {
        FeedbackType::parse(v)
            .map_err(|e| errors.push(FieldError::new("feedbackType", e.to_string())))
            .ok()
    });

    let message = require(&mut errors, "message", &raw.message);
    if let Some(value) = message {
        check_length(
            &mut errors,
            "message",
            value,
            MESSAGE_MIN_LEN,
            MESSAGE_MAX_LEN,
        );
    }

    match (name, email, feedback_type, message) {
        (Some(name), Some(email), Some(feedback_type), Some(message)) if errors.is_empty() => {
            Ok(NewFeedback {
                name: name.to_string(),
                email: email.to_string(),
                phone,
                district,
                feedback_type,
                message: message.to_string(),
            })
        }
        _ => Err(errors),
    }
}
