#![forbid(unsafe_code)]
//! Wire contract of the portal: error envelope, response DTOs, query-parameter
//! parsing, and the declarative submission validation layer.

mod dto;
mod errors;
mod params;
mod validate;

pub use dto::{
    DistrictOverviewDto, FeedbackTrackDto, LoginResponseDto, PublicRequestDto, StatsDto,
    StatusCountDto, SubmitReceiptDto, TrackViewDto,
};
pub use errors::{ApiError, ApiErrorCode};
pub use params::{parse_feedback_filter, parse_recent_limit, parse_request_filter, MAX_RECENT};
pub use validate::{
    validate_feedback, validate_request, FieldError, RawFeedbackSubmission, RawRequestSubmission,
};

pub const CRATE_NAME: &str = "sewa-portal-api";
