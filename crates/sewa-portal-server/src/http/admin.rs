// SPDX-License-Identifier: Apache-2.0

//! Login, logout and the dashboard stats feed.

use super::response_contract::{engine_error_response, error_response, success_response};
use super::{bearer_token, client_key, into_object, rate_limit_response, require_admin, stats_dto};
use crate::auth::AuthError;
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use sewa_portal_api::{ApiError, LoginResponseDto};
use std::net::SocketAddr;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let client = client_key(&state, &headers, peer);
    // Only failed attempts count toward the login limit, so the gate probes
    // without consuming and the failure path records afterwards.
    let decision = state.limiter.login_gate(&client).await;
    if let Some(rejected) = rate_limit_response(decision, &request_id) {
        warn!(client = %client, "login attempts rate limited");
        return rejected;
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

    match state.auth.login(&body.username, &body.password).await {
        Ok(token) => {
            info!(username = %body.username, "admin login");
            let response = LoginResponseDto {
                token,
                expires_in: state.auth.session_ttl().as_secs(),
            };
            success_response(into_object(response), Some("Login successful"))
        }
        Err(AuthError::Internal(detail)) => {
            error!(request_id, "login failed internally: {detail}");
            error_response(ApiError::internal().with_request_id(&request_id))
        }
        Err(_) => {
            state.limiter.record_login_failure(&client).await;
            error_response(ApiError::invalid_credentials().with_request_id(&request_id))
        }
    }
}

pub(crate) async fn logout_handler(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = require_admin(&state, &headers, &request_id).await {
        return *rejection;
    }
    if let Some(token) = bearer_token(&headers) {
        state.auth.logout(token).await;
    }
    success_response(json!({}), Some("Logged out"))
}

pub(crate) async fn stats_handler(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = require_admin(&state, &headers, &request_id).await {
        return *rejection;
    }
    match state.engine.stats().await {
        Ok(stats) => success_response(json!({ "stats": stats_dto(stats) }), None),
        Err(err) => engine_error_response(err, "stats", &request_id),
    }
}
