// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use sewa_portal_model::{District, DISTRICTS};
use sewa_portal_server::auth::{generate_salt, hash_password};
use sewa_portal_server::config::{NotifyConfig, RateLimitSettings, RateRule, ServerConfig};
use sewa_portal_server::notify::Dispatcher;
use sewa_portal_server::{build_router, AppState};
use sewa_portal_store::{AdminCredential, PortalStore};
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default_secs: u64) -> Duration {
    Duration::from_secs(
        env::var(name)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(default_secs),
    )
}

fn env_rate(max_name: &str, window_name: &str, default: RateRule) -> RateRule {
    RateRule {
        max: env_u32(max_name, default.max),
        window: env_secs(window_name, default.window.as_secs()),
    }
}

fn district_chat_map() -> HashMap<District, String> {
    DISTRICTS
        .iter()
        .filter_map(|district| {
            let var = format!(
                "SEWA_TELEGRAM_GROUP_{}",
                district.as_str().to_ascii_uppercase()
            );
            env::var(var).ok().map(|chat_id| (*district, chat_id))
        })
        .collect()
}

fn load_config() -> ServerConfig {
    let defaults = RateLimitSettings::default();
    ServerConfig {
        bind_addr: env::var("SEWA_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        db_path: PathBuf::from(
            env::var("SEWA_DB_PATH").unwrap_or_else(|_| "data/portal.sqlite3".to_string()),
        ),
        trust_proxy: env_bool("SEWA_TRUST_PROXY", true),
        session_ttl: env_secs("SEWA_SESSION_TTL_SECS", 24 * 60 * 60),
        admin_username: env::var("SEWA_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
        rate_limits: RateLimitSettings {
            submit_request: env_rate(
                "SEWA_RATE_SUBMIT_MAX",
                "SEWA_RATE_SUBMIT_WINDOW_SECS",
                defaults.submit_request,
            ),
            submit_feedback: env_rate(
                "SEWA_RATE_FEEDBACK_MAX",
                "SEWA_RATE_FEEDBACK_WINDOW_SECS",
                defaults.submit_feedback,
            ),
            read: env_rate(
                "SEWA_RATE_READ_MAX",
                "SEWA_RATE_READ_WINDOW_SECS",
                defaults.read,
            ),
            admin_login: env_rate(
                "SEWA_RATE_LOGIN_MAX",
                "SEWA_RATE_LOGIN_WINDOW_SECS",
                defaults.admin_login,
            ),
        },
        notify: NotifyConfig {
            sendgrid_api_key: env::var("SEWA_SENDGRID_API_KEY").ok(),
            email_from: env::var("SEWA_EMAIL_FROM").ok(),
            telegram_bot_token: env::var("SEWA_TELEGRAM_BOT_TOKEN").ok(),
            district_chats: district_chat_map(),
            public_base_url: env::var("SEWA_PUBLIC_BASE_URL").ok(),
            ..NotifyConfig::disabled()
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("SEWA_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Seed credential from env on startup; without one, an empty credential
/// table means no admin can log in until it is provisioned out of band.
fn seed_admin(store: &PortalStore, username: &str) -> Result<(), String> {
    match env::var("SEWA_ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => {
            let salt = generate_salt();
            store
                .upsert_admin(&AdminCredential {
                    username: username.to_string(),
                    password_salt: salt.clone(),
                    password_hash: hash_password(&salt, &password),
                })
                .map_err(|e| format!("seeding admin credential failed: {e}"))?;
            info!(username, "admin credential seeded from environment");
            Ok(())
        }
        _ => {
            let exists = store
                .admin_exists(username)
                .map_err(|e| format!("credential lookup failed: {e}"))?;
            if !exists {
                warn!(
                    username,
                    "no admin credential present and SEWA_ADMIN_PASSWORD unset; admin routes will reject all logins"
                );
            }
            Ok(())
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();
    let config = load_config();

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("creating {} failed: {e}", parent.display()))?;
        }
    }
    let store = Arc::new(
        PortalStore::open(&config.db_path)
            .map_err(|e| format!("opening {} failed: {e}", config.db_path.display()))?,
    );
    seed_admin(&store, &config.admin_username)?;

    let notifier = Arc::new(Dispatcher::from_config(&config.notify));
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, store, notifier);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("binding {bind_addr} failed: {e}"))?;
    info!("sewa-portal-server listening on {bind_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_shutdown_signal())
    .await
    .map_err(|e| format!("server failed: {e}"))
}
