// SPDX-License-Identifier: Apache-2.0

pub(crate) mod admin;
pub(crate) mod feedback;
pub(crate) mod public;
pub(crate) mod requests;
pub(crate) mod response_contract;

use crate::auth::{AuthError, Session};
use crate::rate_limiter::Decision;
use crate::AppState;
use axum::http::HeaderMap;
use axum::response::Response;
use response_contract::error_response;
use serde_json::{Map, Value};
use sewa_portal_api::{ApiError, StatsDto, StatusCountDto};
use sewa_portal_store::StoreStats;
use std::net::SocketAddr;

/// The rate-limit key must be the real client, not the proxy: behind the
/// trusted reverse proxy the first `x-forwarded-for` entry wins, otherwise
/// the socket peer address.
pub(crate) fn client_key(state: &AppState, headers: &HeaderMap, peer: SocketAddr) -> String {
    if state.config.trust_proxy {
        if let Some(forwarded) = normalized_forwarded_for(headers) {
            return forwarded;
        }
    }
    peer.ip().to_string()
}

fn normalized_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    Some(first.to_string())
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Gate for admin routes; the rejection response is ready to return as-is.
pub(crate) async fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
    request_id: &str,
) -> Result<Session, Box<Response>> {
    let Some(token) = bearer_token(headers) else {
        return Err(Box::new(error_response(
            ApiError::unauthorized().with_request_id(request_id),
        )));
    };
    match state.auth.authenticate(token).await {
        Ok(session) => Ok(session),
        Err(AuthError::Internal(detail)) => {
            tracing::error!(request_id, "session lookup failed: {detail}");
            Err(Box::new(error_response(
                ApiError::internal().with_request_id(request_id),
            )))
        }
        Err(_) => Err(Box::new(error_response(
            ApiError::unauthorized().with_request_id(request_id),
        ))),
    }
}

pub(crate) fn rate_limit_response(decision: Decision, request_id: &str) -> Option<Response> {
    match decision {
        Decision::Allowed => None,
        limited => Some(error_response(
            ApiError::rate_limited(limited.retry_after_secs()).with_request_id(request_id),
        )),
    }
}

pub(crate) fn stats_dto(stats: StoreStats) -> StatsDto {
    let counts = |pairs: Vec<(String, i64)>| {
        pairs
            .into_iter()
            .map(|(label, count)| StatusCountDto { label, count })
            .collect()
    };
    StatsDto {
        total: stats.total,
        pending: stats.pending,
        approved: stats.approved,
        rejected: stats.rejected,
        by_district: counts(stats.by_district),
        by_priority: counts(stats.by_priority),
    }
}

/// Serializes a DTO into the object map the success envelope merges over.
pub(crate) fn into_object(value: impl serde::Serialize) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => value,
        Err(_) => Value::Object(Map::new()),
    }
}
