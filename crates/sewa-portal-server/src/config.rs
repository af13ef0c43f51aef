// SPDX-License-Identifier: Apache-2.0

use sewa_portal_model::District;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// One rate-limit bucket: at most `max` hits per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRule {
    pub max: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub submit_request: RateRule,
    pub submit_feedback: RateRule,
    pub read: RateRule,
    pub admin_login: RateRule,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            submit_request: RateRule {
                max: 20,
                window: Duration::from_secs(15 * 60),
            },
            submit_feedback: RateRule {
                max: 15,
                window: Duration::from_secs(15 * 60),
            },
            read: RateRule {
                max: 100,
                window: Duration::from_secs(60),
            },
            // Counts failed attempts only; see RateLimiter::login_gate.
            admin_login: RateRule {
                max: 5,
                window: Duration::from_secs(15 * 60),
            },
        }
    }
}

/// Outbound notification transports. Every field is optional: an
/// unconfigured channel is a logged no-op, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyConfig {
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_endpoint: String,
    pub email_from: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_api_base: String,
    pub district_chats: HashMap<District, String>,
    pub public_base_url: Option<String>,
}

impl NotifyConfig {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            sendgrid_endpoint: "https://api.sendgrid.com/v3/mail/send".to_string(),
            telegram_api_base: "https://api.telegram.org".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    /// When true the first `x-forwarded-for` entry is the client key for
    /// rate limiting; the socket peer address otherwise.
    pub trust_proxy: bool,
    pub session_ttl: Duration,
    pub admin_username: String,
    pub rate_limits: RateLimitSettings,
    pub notify: NotifyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            db_path: PathBuf::from("data/portal.sqlite3"),
            trust_proxy: true,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            admin_username: "admin".to_string(),
            rate_limits: RateLimitSettings::default(),
            notify: NotifyConfig::disabled(),
        }
    }
}
