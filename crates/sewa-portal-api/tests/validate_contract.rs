use sewa_portal_api::{validate_feedback, validate_request, RawFeedbackSubmission, RawRequestSubmission};
use sewa_portal_model::{District, FeedbackType, Priority};

fn valid_submission() -> RawRequestSubmission {
    RawRequestSubmission {
        name: Some("Anita Rai".to_string()),
        email: Some("anita@example.com".to_string()),
        phone: Some("9812345670".to_string()),
        district: Some("Gangtok".to_string()),
        gpu: Some("Martam-Rumtek".to_string()),
        location: Some("Ward 3, near the school".to_string()),
        amenities: Some(vec!["Water Supply".to_string()]),
        other_amenity: None,
        description: Some("No water supply for the last two weeks.".to_string()),
        population: Some(250),
        priority: Some("High".to_string()),
    }
}

#[test]
fn a_fully_valid_submission_produces_a_clean_input() {
    let clean = validate_request(&valid_submission()).expect("valid submission");
    assert_eq!(clean.district, District::Gangtok);
    assert_eq!(clean.priority, Priority::High);
    assert_eq!(clean.phone, "9812345670");
    assert_eq!(clean.amenities, vec!["Water Supply".to_string()]);
}

#[test]
fn all_violations_are_reported_together_not_first_only() {
    let raw = RawRequestSubmission {
        name: None,
        email: Some("not-an-email".to_string()),
        phone: Some("12345".to_string()),
        district: Some("Unknown".to_string()),
        ..valid_submission()
    };
    let errors = validate_request(&raw).expect_err("invalid submission");
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"phone"));
    assert!(fields.contains(&"district"));
    assert_eq!(fields.len(), 4);
}

#[test]
fn phone_accepts_separators_but_enforces_indian_mobile_shape() {
    let raw = RawRequestSubmission {
        phone: Some("98123-45670".to_string()),
        ..valid_submission()
    };
    let clean = validate_request(&raw).expect("separators stripped");
    assert_eq!(clean.phone, "9812345670");

    for bad in ["12345", "5812345670", "98123456701", "abcdefghij"] {
        let raw = RawRequestSubmission {
            phone: Some(bad.to_string()),
            ..valid_submission()
        };
        let errors = validate_request(&raw).expect_err("bad phone");
        assert!(errors.iter().any(|e| e.field == "phone"), "{bad} accepted");
    }
}

#[test]
fn other_amenity_is_mandatory_exactly_when_other_is_selected() {
    let raw = RawRequestSubmission {
        amenities: Some(vec!["Other".to_string()]),
        other_amenity: None,
        ..valid_submission()
    };
    let errors = validate_request(&raw).expect_err("missing companion text");
    assert!(errors.iter().any(|e| e.field == "otherAmenity"));

    let raw = RawRequestSubmission {
        amenities: Some(vec!["Other".to_string()]),
        other_amenity: Some("Skate park".to_string()),
        ..valid_submission()
    };
    let clean = validate_request(&raw).expect("companion supplied");
    assert_eq!(clean.other_amenity.as_deref(), Some("Skate park"));

    // No "Other" selected: the companion stays optional.
    let raw = RawRequestSubmission {
        other_amenity: None,
        ..valid_submission()
    };
    assert!(validate_request(&raw).is_ok());
}

#[test]
fn amenities_must_be_a_non_empty_list_of_non_empty_labels() {
    for list in [vec![], vec!["  ".to_string()]] {
        let raw = RawRequestSubmission {
            amenities: Some(list),
            ..valid_submission()
        };
        let errors = validate_request(&raw).expect_err("empty amenities");
        assert!(errors.iter().any(|e| e.field == "amenities"));
    }
}

#[test]
fn population_bounds_are_enforced_when_present() {
    for bad in [0i64, -5, 10_000_001] {
        let raw = RawRequestSubmission {
            population: Some(bad),
            ..valid_submission()
        };
        let errors = validate_request(&raw).expect_err("bad population");
        assert!(errors.iter().any(|e| e.field == "population"));
    }
    let raw = RawRequestSubmission {
        population: None,
        ..valid_submission()
    };
    assert!(validate_request(&raw).is_ok());
}

#[test]
fn feedback_requires_type_and_message_but_not_phone_or_district() {
    let raw = RawFeedbackSubmission {
        name: Some("Pema Sherpa".to_string()),
        email: Some("pema@example.com".to_string()),
        phone: None,
        district: None,
        feedback_type: Some("Suggestion".to_string()),
        message: Some("Please add evening bus service.".to_string()),
    };
    let clean = validate_feedback(&raw).expect("valid feedback");
    assert_eq!(clean.feedback_type, FeedbackType::Suggestion);
    assert!(clean.phone.is_none());
    assert!(clean.district.is_none());

    let raw = RawFeedbackSubmission {
        feedback_type: Some("Rant".to_string()),
        message: Some("short".to_string()),
        ..raw
    };
    let errors = validate_feedback(&raw).expect_err("invalid feedback");
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"feedbackType"));
    assert!(fields.contains(&"message"));
}
