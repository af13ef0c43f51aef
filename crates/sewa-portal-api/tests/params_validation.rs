use sewa_portal_api::{
    parse_feedback_filter, parse_recent_limit, parse_request_filter, ApiErrorCode, MAX_RECENT,
};
use sewa_portal_model::{District, FeedbackType, Priority, RequestStatus};
use std::collections::BTreeMap;

fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn empty_query_is_an_unfiltered_listing() {
    let filter = parse_request_filter(&query(&[])).expect("no filters");
    assert!(filter.is_empty());
}

#[test]
fn known_filter_values_parse_into_typed_members() {
    let filter = parse_request_filter(&query(&[
        ("status", "In Progress"),
        ("district", "Namchi"),
        ("priority", "High"),
    ]))
    .expect("valid filters");
    assert_eq!(filter.status, Some(RequestStatus::InProgress));
    assert_eq!(filter.district, Some(District::Namchi));
    assert_eq!(filter.priority, Some(Priority::High));
}

#[test]
fn unknown_filter_values_are_rejected_not_ignored() {
    for (key, value) in [
        ("status", "Started"),
        ("district", "Kalimpong"),
        ("priority", "urgent"),
    ] {
        let err = parse_request_filter(&query(&[(key, value)])).expect_err("invalid value");
        assert_eq!(err.code, ApiErrorCode::InvalidParameter);
    }
}

#[test]
fn feedback_filter_accepts_type_and_status() {
    let filter =
        parse_feedback_filter(&query(&[("status", "New"), ("type", "Complaint")]))
            .expect("valid filters");
    assert_eq!(filter.feedback_type, Some(FeedbackType::Complaint));
    assert!(parse_feedback_filter(&query(&[("type", "Gripe")])).is_err());
}

#[test]
fn recent_limit_defaults_and_clamps() {
    assert_eq!(parse_recent_limit(&query(&[])).expect("default"), 10);
    assert_eq!(
        parse_recent_limit(&query(&[("limit", "5")])).expect("explicit"),
        5
    );
    assert_eq!(
        parse_recent_limit(&query(&[("limit", "9999")])).expect("clamped"),
        MAX_RECENT
    );
    assert!(parse_recent_limit(&query(&[("limit", "0")])).is_err());
    assert!(parse_recent_limit(&query(&[("limit", "many")])).is_err());
}
