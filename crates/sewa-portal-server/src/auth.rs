// SPDX-License-Identifier: Apache-2.0

//! Admin credential verification and bearer-token sessions. Sessions live in
//! an injected store (in-memory by default) and expire lazily on the next
//! authenticate call; restarting the process logs every admin out.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sewa_portal_store::{AdminCredential, PortalStore};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    /// Covers unknown username and wrong password alike.
    InvalidCredentials,
    /// Token missing, unknown, or expired.
    Unauthorized,
    Internal(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => f.write_str("invalid credentials"),
            Self::Unauthorized => f.write_str("authentication required"),
            Self::Internal(msg) => write!(f, "auth internal error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub created_at: Instant,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, token: String, session: Session);
    async fn get(&self, token: &str) -> Option<Session>;
    async fn remove(&self, token: &str);
}

pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, token: String, session: Session) {
        self.sessions.lock().await.insert(token, session);
    }

    async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.lock().await.get(token).cloned()
    }

    async fn remove(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }
}

/// Salted one-way hash: `base64url(hmac_sha256(salt, password))`.
#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes()).expect("hmac accepts any key size");
    mac.update(password.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

#[must_use]
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn verify_password(credential: &AdminCredential, password: &str) -> bool {
    let Ok(expected) = URL_SAFE_NO_PAD.decode(&credential.password_hash) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(credential.password_salt.as_bytes()) else {
        return false;
    };
    mac.update(password.as_bytes());
    // Mac::verify_slice compares in constant time.
    mac.verify_slice(&expected).is_ok()
}

fn mint_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct AdminAuth {
    store: Arc<PortalStore>,
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl AdminAuth {
    #[must_use]
    pub fn new(store: Arc<PortalStore>, sessions: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self {
            store,
            sessions,
            ttl,
        }
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let store = self.store.clone();
        let username_owned = username.to_string();
        let credential = tokio::task::spawn_blocking(move || store.get_admin(&username_owned))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let Some(credential) = credential else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&credential, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = mint_token();
        self.sessions
            .insert(
                token.clone(),
                Session {
                    username: credential.username,
                    created_at: Instant::now(),
                },
            )
            .await;
        Ok(token)
    }

    pub async fn authenticate(&self, token: &str) -> Result<Session, AuthError> {
        self.authenticate_at(token, Instant::now()).await
    }

    /// Expiry check against an explicit clock reading; `authenticate` passes
    /// the real one.
    pub async fn authenticate_at(&self, token: &str, now: Instant) -> Result<Session, AuthError> {
        let Some(session) = self.sessions.get(token).await else {
            return Err(AuthError::Unauthorized);
        };
        if now.duration_since(session.created_at) > self.ttl {
            self.sessions.remove(token).await;
            return Err(AuthError::Unauthorized);
        }
        Ok(session)
    }

    pub async fn logout(&self, token: &str) {
        self.sessions.remove(token).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_admin(username: &str, password: &str) -> Arc<PortalStore> {
        let store = Arc::new(PortalStore::open_in_memory().expect("store"));
        let salt = generate_salt();
        store
            .upsert_admin(&AdminCredential {
                username: username.to_string(),
                password_salt: salt.clone(),
                password_hash: hash_password(&salt, password),
            })
            .expect("seed admin");
        store
    }

    fn auth_with(ttl: Duration) -> AdminAuth {
        AdminAuth::new(
            store_with_admin("admin", "hunter2hunter2"),
            Arc::new(InMemorySessionStore::new()),
            ttl,
        )
    }

    #[tokio::test]
    async fn login_issues_a_token_that_authenticates() {
        let auth = auth_with(Duration::from_secs(86400));
        let token = auth.login("admin", "hunter2hunter2").await.expect("login");
        let session = auth.authenticate(&token).await.expect("session");
        assert_eq!(session.username, "admin");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let auth = auth_with(Duration::from_secs(86400));
        let wrong_password = auth.login("admin", "nope").await.expect_err("bad password");
        let unknown_user = auth.login("ghost", "nope").await.expect_err("unknown user");
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn sessions_expire_after_the_ttl_and_are_evicted() {
        let auth = auth_with(Duration::from_secs(86400));
        let token = auth.login("admin", "hunter2hunter2").await.expect("login");

        let issued = auth.authenticate(&token).await.expect("fresh").created_at;
        let after_expiry = issued + Duration::from_secs(86401);
        assert_eq!(
            auth.authenticate_at(&token, after_expiry).await,
            Err(AuthError::Unauthorized)
        );
        // Lazy eviction: the expired session is gone even for an immediate
        // re-check with a fresh clock reading.
        assert_eq!(
            auth.authenticate(&token).await,
            Err(AuthError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn tampered_and_unknown_tokens_are_rejected() {
        let auth = auth_with(Duration::from_secs(86400));
        let token = auth.login("admin", "hunter2hunter2").await.expect("login");
        let mut tampered = token.clone();
        tampered.pop();
        assert!(auth.authenticate(&tampered).await.is_err());
        assert!(auth.authenticate("not-a-token").await.is_err());
    }

    #[tokio::test]
    async fn logout_evicts_unconditionally() {
        let auth = auth_with(Duration::from_secs(86400));
        let token = auth.login("admin", "hunter2hunter2").await.expect("login");
        auth.logout(&token).await;
        assert!(auth.authenticate(&token).await.is_err());
    }

    #[test]
    fn hashes_are_salted_and_deterministic_per_salt() {
        let salt_a = generate_salt();
        let salt_b = generate_salt();
        assert_ne!(salt_a, salt_b);
        assert_eq!(
            hash_password(&salt_a, "password"),
            hash_password(&salt_a, "password")
        );
        assert_ne!(
            hash_password(&salt_a, "password"),
            hash_password(&salt_b, "password")
        );
    }
}
