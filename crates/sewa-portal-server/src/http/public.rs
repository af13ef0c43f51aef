// SPDX-License-Identifier: Apache-2.0

//! Unauthenticated routes: reference tracking, the recent feed, per-district
//! overviews, liveness. All of them draw from the shared read bucket.

use super::response_contract::{engine_error_response, error_response, success_response};
use super::{client_key, into_object, rate_limit_response, stats_dto};
use crate::engine::TrackedItem;
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Extension;
use serde_json::json;
use sewa_portal_api::{
    parse_recent_limit, ApiError, DistrictOverviewDto, FeedbackTrackDto, PublicRequestDto,
    TrackViewDto,
};
use sewa_portal_model::District;
use std::collections::BTreeMap;
use std::net::SocketAddr;

pub(crate) async fn healthz_handler() -> Response {
    success_response(json!({ "status": "ok" }), None)
}

pub(crate) async fn track_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Response {
    let client = client_key(&state, &headers, peer);
    let decision = state.limiter.allow_read(&client).await;
    if let Some(rejected) = rate_limit_response(decision, &request_id) {
        return rejected;
    }

    match state.engine.track(&reference).await {
        Ok(TrackedItem::Request(record)) => success_response(
            json!({ "request": TrackViewDto::from_record(&record) }),
            None,
        ),
        Ok(TrackedItem::Feedback(record)) => success_response(
            json!({ "feedback": FeedbackTrackDto::from_record(&record) }),
            None,
        ),
        Err(err) => engine_error_response(err, "submission", &request_id),
    }
}

pub(crate) async fn recent_requests_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let client = client_key(&state, &headers, peer);
    let decision = state.limiter.allow_read(&client).await;
    if let Some(rejected) = rate_limit_response(decision, &request_id) {
        return rejected;
    }

    let limit = match parse_recent_limit(&query) {
        Ok(limit) => limit,
        Err(err) => return error_response(err.with_request_id(&request_id)),
    };
    match state.engine.recent_public(limit).await {
        Ok(records) => {
            let rows: Vec<PublicRequestDto> =
                records.iter().map(PublicRequestDto::from_record).collect();
            success_response(json!({ "requests": rows }), None)
        }
        Err(err) => engine_error_response(err, "request", &request_id),
    }
}

pub(crate) async fn district_requests_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(district): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let client = client_key(&state, &headers, peer);
    let decision = state.limiter.allow_read(&client).await;
    if let Some(rejected) = rate_limit_response(decision, &request_id) {
        return rejected;
    }

    let Ok(district) = District::parse(&district) else {
        return error_response(
            ApiError::invalid_param("district", &district).with_request_id(&request_id),
        );
    };
    let limit = match parse_recent_limit(&query) {
        Ok(limit) => limit,
        Err(err) => return error_response(err.with_request_id(&request_id)),
    };
    match state.engine.district_overview(district, limit).await {
        Ok((records, stats)) => {
            let overview = DistrictOverviewDto {
                district,
                requests: records.iter().map(PublicRequestDto::from_record).collect(),
                stats: stats_dto(stats),
            };
            success_response(into_object(overview), None)
        }
        Err(err) => engine_error_response(err, "district", &request_id),
    }
}
