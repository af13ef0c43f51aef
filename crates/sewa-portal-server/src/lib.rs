#![forbid(unsafe_code)]
//! Civic-amenity request portal: axum HTTP surface over the lifecycle
//! engine, with process-local rate limiting and admin sessions.
//!
//! Single-instance by design: the rate-limit counters and session map live
//! behind injectable store traits, but the bundled implementations are
//! in-process. Running multiple replicas behind one load balancer
//! under-enforces limits and fragments sessions; inject shared stores
//! before scaling out.

pub mod auth;
pub mod config;
pub mod engine;
mod http;
mod middleware;
pub mod notify;
pub mod rate_limiter;

pub use middleware::request_tracing::RequestId;

use auth::{AdminAuth, InMemorySessionStore, SessionStore};
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use config::ServerConfig;
use engine::LifecycleEngine;
use notify::Notify;
use rate_limiter::{InMemoryRateLimitStore, RateLimitStore, RateLimiter};
use sewa_portal_store::PortalStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub engine: Arc<LifecycleEngine>,
    pub auth: Arc<AdminAuth>,
    pub limiter: Arc<RateLimiter>,
    request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    /// In-memory session and rate-limit stores; the default single-instance
    /// wiring.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<PortalStore>, notifier: Arc<dyn Notify>) -> Self {
        Self::with_stores(
            config,
            store,
            notifier,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryRateLimitStore::new()),
        )
    }

    /// Injection point for shared session/rate-limit backends; call sites do
    /// not change when a deployment swaps these out.
    #[must_use]
    pub fn with_stores(
        config: ServerConfig,
        store: Arc<PortalStore>,
        notifier: Arc<dyn Notify>,
        sessions: Arc<dyn SessionStore>,
        rate_limits: Arc<dyn RateLimitStore>,
    ) -> Self {
        let auth = Arc::new(AdminAuth::new(store.clone(), sessions, config.session_ttl));
        let limiter = Arc::new(RateLimiter::new(rate_limits, config.rate_limits.clone()));
        let engine = Arc::new(LifecycleEngine::new(store, notifier));
        Self {
            config: Arc::new(config),
            engine,
            auth,
            limiter,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    pub(crate) fn next_request_id(&self) -> String {
        format!("req-{:08x}", self.request_id_seed.fetch_add(1, Ordering::Relaxed))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::public::healthz_handler))
        .route(
            "/api/requests",
            post(http::requests::submit_request_handler).get(http::requests::list_requests_handler),
        )
        .route(
            "/api/requests/public/recent",
            get(http::public::recent_requests_handler),
        )
        .route(
            "/api/requests/:id",
            get(http::requests::get_request_handler)
                .put(http::requests::update_request_handler)
                .delete(http::requests::delete_request_handler),
        )
        .route("/api/track/:reference_id", get(http::public::track_handler))
        .route(
            "/api/districts/:district/requests",
            get(http::public::district_requests_handler),
        )
        .route(
            "/api/feedback",
            post(http::feedback::submit_feedback_handler).get(http::feedback::list_feedback_handler),
        )
        .route(
            "/api/feedback/:id",
            get(http::feedback::get_feedback_handler)
                .put(http::feedback::update_feedback_handler)
                .delete(http::feedback::delete_feedback_handler),
        )
        .route("/api/admin/login", post(http::admin::login_handler))
        .route("/api/admin/logout", post(http::admin::logout_handler))
        .route("/api/stats", get(http::admin::stats_handler))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
