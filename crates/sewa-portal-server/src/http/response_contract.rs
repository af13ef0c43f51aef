// SPDX-License-Identifier: Apache-2.0

use crate::engine::EngineError;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use sewa_portal_api::{ApiError, ApiErrorCode};
use tracing::error;

#[must_use]
pub(crate) fn api_error_status(code: ApiErrorCode) -> StatusCode {
    match code {
        ApiErrorCode::ValidationFailed | ApiErrorCode::InvalidParameter => StatusCode::BAD_REQUEST,
        ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
        ApiErrorCode::InvalidCredentials | ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ApiErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ApiErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Every failure leaves through here: `success: false`, the human-readable
/// message at the top level, the machine-readable detail under `error`, and
/// a `retry-after` hint on 429s.
#[must_use]
pub(crate) fn error_response(err: ApiError) -> Response {
    let status = api_error_status(err.code);
    let retry_after = err
        .details
        .get("retry_after_secs")
        .and_then(Value::as_u64);
    let body = Json(json!({
        "success": false,
        "message": err.message.clone(),
        "error": err,
    }));
    let mut response = (status, body).into_response();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let hint = retry_after.unwrap_or(3).to_string();
        if let Ok(value) = HeaderValue::from_str(&hint) {
            response.headers_mut().insert("retry-after", value);
        }
    }
    response
}

/// `success: true` merged over an object payload.
#[must_use]
pub(crate) fn success_response(payload: Value, message: Option<&str>) -> Response {
    let mut map = match payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    map.insert("success".to_string(), Value::Bool(true));
    if let Some(message) = message {
        map.insert("message".to_string(), Value::String(message.to_string()));
    }
    (StatusCode::OK, Json(Value::Object(map))).into_response()
}

/// Engine results map onto the wire taxonomy; internal detail is logged here
/// and never serialized.
#[must_use]
pub(crate) fn engine_error_response(err: EngineError, what: &str, request_id: &str) -> Response {
    match err {
        EngineError::Validation(field_errors) => {
            error_response(ApiError::validation_failed(&field_errors).with_request_id(request_id))
        }
        EngineError::NotFound => {
            error_response(ApiError::not_found(what).with_request_id(request_id))
        }
        EngineError::Internal(detail) => {
            error!(request_id, "{what} operation failed: {detail}");
            error_response(ApiError::internal().with_request_id(request_id))
        }
    }
}
