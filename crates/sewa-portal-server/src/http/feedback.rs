// SPDX-License-Identifier: Apache-2.0

//! Feedback routes; the CRUD surface mirrors requests with its own status
//! vocabulary.

use super::response_contract::{engine_error_response, error_response, success_response};
use super::{client_key, into_object, rate_limit_response, require_admin};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use sewa_portal_api::{
    parse_feedback_filter, ApiError, FieldError, RawFeedbackSubmission, SubmitReceiptDto,
};
use sewa_portal_model::{FeedbackStatus, NOTES_MAX_LEN};
use std::collections::BTreeMap;
use std::net::SocketAddr;

pub(crate) async fn submit_feedback_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<RawFeedbackSubmission>, JsonRejection>,
) -> Response {
    let client = client_key(&state, &headers, peer);
    let decision = state.limiter.allow_submit_feedback(&client).await;
    if let Some(rejected) = rate_limit_response(decision, &request_id) {
        return rejected;
    }

    let Json(raw) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(ApiError::new(
                sewa_portal_api::ApiErrorCode::ValidationFailed,
                "request body must be valid JSON",
                json!({ "detail": rejection.body_text() }),
                request_id,
            ));
        }
    };

    match state.engine.submit_feedback(&raw).await {
        Ok(record) => success_response(
            into_object(SubmitReceiptDto {
                reference_id: record.reference_id,
                id: record.id,
            }),
            Some("Feedback submitted successfully"),
        ),
        Err(err) => engine_error_response(err, "feedback", &request_id),
    }
}

pub(crate) async fn list_feedback_handler(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    if let Err(rejection) = require_admin(&state, &headers, &request_id).await {
        return *rejection;
    }
    let filter = match parse_feedback_filter(&query) {
        Ok(filter) => filter,
        Err(err) => return error_response(err.with_request_id(&request_id)),
    };
    match state.engine.list_feedback(filter).await {
        Ok(records) => success_response(json!({ "feedback": records }), None),
        Err(err) => engine_error_response(err, "feedback", &request_id),
    }
}

pub(crate) async fn get_feedback_handler(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejection) = require_admin(&state, &headers, &request_id).await {
        return *rejection;
    }
    match state.engine.get_feedback(id).await {
        Ok(record) => success_response(json!({ "feedback": record }), None),
        Err(err) => engine_error_response(err, "feedback", &request_id),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateFeedbackBody {
    status: String,
    #[serde(default)]
    admin_notes: Option<String>,
}

pub(crate) async fn update_feedback_handler(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateFeedbackBody>, JsonRejection>,
) -> Response {
    if let Err(rejection) = require_admin(&state, &headers, &request_id).await {
        return *rejection;
    }
    let Json(body) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(ApiError::new(
                sewa_portal_api::ApiErrorCode::ValidationFailed,
                "request body must be valid JSON",
                json!({ "detail": rejection.body_text() }),
                request_id,
            ));
        }
    };

    let mut field_errors = Vec::new();
    let status = FeedbackStatus::parse(&body.status)
        .map_err(|e| {
            field_errors.push(FieldError {
                field: "status".to_string(),
                message: e.to_string(),
            });
        })
        .ok();
    let notes = body
        .admin_notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if let Some(value) = &notes {
        if value.chars().count() > NOTES_MAX_LEN {
            field_errors.push(FieldError {
                field: "adminNotes".to_string(),
                message: format!("adminNotes must be at most {NOTES_MAX_LEN} characters"),
            });
        }
    }
    let Some(status) = status.filter(|_| field_errors.is_empty()) else {
        return error_response(
            ApiError::validation_failed(&field_errors).with_request_id(&request_id),
        );
    };

    match state.engine.update_feedback(id, status, notes).await {
        Ok(record) => success_response(
            json!({ "feedback": record }),
            Some("Feedback updated successfully"),
        ),
        Err(err) => engine_error_response(err, "feedback", &request_id),
    }
}

pub(crate) async fn delete_feedback_handler(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejection) = require_admin(&state, &headers, &request_id).await {
        return *rejection;
    }
    match state.engine.delete_feedback(id).await {
        Ok(()) => success_response(json!({}), Some("Feedback deleted successfully")),
        Err(err) => engine_error_response(err, "feedback", &request_id),
    }
}
