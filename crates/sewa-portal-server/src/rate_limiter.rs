// SPDX-License-Identifier: Apache-2.0

//! Fixed-window counters keyed by client address. The store sits behind a
//! trait so a multi-process deployment can inject a shared backend without
//! touching call sites; the bundled in-memory map is the single-instance
//! default and its limits are per-process.

use crate::config::{RateLimitSettings, RateRule};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited { retry_after: Duration },
}

impl Decision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    #[must_use]
    pub fn retry_after_secs(self) -> u64 {
        match self {
            Self::Allowed => 0,
            Self::Limited { retry_after } => retry_after.as_secs().max(1),
        }
    }
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomic check-and-increment for one key.
    async fn hit(&self, key: &str, rule: RateRule, now: Instant) -> Decision;
    /// Check without consuming; used where only failures count.
    async fn probe(&self, key: &str, rule: RateRule, now: Instant) -> Decision;
    /// Increment without checking; the paired `probe` already decided.
    async fn record(&self, key: &str, rule: RateRule, now: Instant);
}

#[derive(Debug, Clone, Copy)]
struct WindowSlot {
    started: Instant,
    count: u32,
}

struct Windows {
    slots: HashMap<String, WindowSlot>,
    last_prune: Instant,
}

pub struct InMemoryRateLimitStore {
    windows: Mutex<Windows>,
}

/// Expired slots are swept at most this often so the map stays bounded
/// without a background task.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

impl InMemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(Windows {
                slots: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_decision(slot: &WindowSlot, rule: RateRule, now: Instant) -> Decision {
    if slot.count < rule.max {
        Decision::Allowed
    } else {
        let elapsed = now.duration_since(slot.started);
        Decision::Limited {
            retry_after: rule.window.saturating_sub(elapsed),
        }
    }
}

impl Windows {
    fn roll(&mut self, key: &str, window: Duration, now: Instant) -> &mut WindowSlot {
        if now.duration_since(self.last_prune) >= PRUNE_INTERVAL {
            self.slots
                .retain(|_, slot| now.duration_since(slot.started) < window);
            self.last_prune = now;
        }
        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert(WindowSlot { started: now, count: 0 });
        if now.duration_since(slot.started) >= window {
            *slot = WindowSlot {
                started: now,
                count: 0,
            };
        }
        slot
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, rule: RateRule, now: Instant) -> Decision {
        let mut guard = self.windows.lock().await;
        let slot = guard.roll(key, rule.window, now);
        let decision = slot_decision(slot, rule, now);
        if decision.is_allowed() {
            slot.count += 1;
        }
        decision
    }

    async fn probe(&self, key: &str, rule: RateRule, now: Instant) -> Decision {
        let mut guard = self.windows.lock().await;
        let slot = guard.roll(key, rule.window, now);
        slot_decision(slot, rule, now)
    }

    async fn record(&self, key: &str, rule: RateRule, now: Instant) {
        let mut guard = self.windows.lock().await;
        let slot = guard.roll(key, rule.window, now);
        slot.count = slot.count.saturating_add(1);
    }
}

/// Bucketed front over the store; handlers only ever see these methods.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    settings: RateLimitSettings,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, settings: RateLimitSettings) -> Self {
        Self { store, settings }
    }

    pub async fn allow_submit_request(&self, client: &str) -> Decision {
        self.store
            .hit(
                &format!("submit_request:{client}"),
                self.settings.submit_request,
                Instant::now(),
            )
            .await
    }

    pub async fn allow_submit_feedback(&self, client: &str) -> Decision {
        self.store
            .hit(
                &format!("submit_feedback:{client}"),
                self.settings.submit_feedback,
                Instant::now(),
            )
            .await
    }

    pub async fn allow_read(&self, client: &str) -> Decision {
        self.store
            .hit(&format!("read:{client}"), self.settings.read, Instant::now())
            .await
    }

    /// Login is gated on prior failures only, so a correct password on the
    /// first try never burns budget.
    pub async fn login_gate(&self, client: &str) -> Decision {
        self.store
            .probe(
                &format!("admin_login:{client}"),
                self.settings.admin_login,
                Instant::now(),
            )
            .await
    }

    pub async fn record_login_failure(&self, client: &str) {
        self.store
            .record(
                &format!("admin_login:{client}"),
                self.settings.admin_login,
                Instant::now(),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(max: u32, secs: u64) -> RateRule {
        RateRule {
            max,
            window: Duration::from_secs(secs),
        }
    }

    #[tokio::test]
    async fn the_twenty_first_hit_in_a_window_is_rejected() {
        let store = InMemoryRateLimitStore::new();
        let now = Instant::now();
        let r = rule(20, 900);
        for _ in 0..20 {
            assert!(store.hit("submit_request:1.2.3.4", r, now).await.is_allowed());
        }
        let decision = store.hit("submit_request:1.2.3.4", r, now).await;
        assert!(!decision.is_allowed());
        assert!(decision.retry_after_secs() > 0);
    }

    #[tokio::test]
    async fn windows_reset_after_they_elapse() {
        let store = InMemoryRateLimitStore::new();
        let start = Instant::now();
        let r = rule(2, 900);
        assert!(store.hit("k", r, start).await.is_allowed());
        assert!(store.hit("k", r, start).await.is_allowed());
        assert!(!store.hit("k", r, start).await.is_allowed());

        let later = start + Duration::from_secs(901);
        assert!(store.hit("k", r, later).await.is_allowed());
    }

    #[tokio::test]
    async fn keys_do_not_share_budgets() {
        let store = InMemoryRateLimitStore::new();
        let now = Instant::now();
        let r = rule(1, 900);
        assert!(store.hit("a", r, now).await.is_allowed());
        assert!(!store.hit("a", r, now).await.is_allowed());
        assert!(store.hit("b", r, now).await.is_allowed());
    }

    #[tokio::test]
    async fn probe_does_not_consume_and_record_does_not_gate() {
        let store = InMemoryRateLimitStore::new();
        let now = Instant::now();
        let r = rule(2, 900);
        for _ in 0..10 {
            assert!(store.probe("login", r, now).await.is_allowed());
        }
        store.record("login", r, now).await;
        store.record("login", r, now).await;
        assert!(!store.probe("login", r, now).await.is_allowed());
    }

    #[tokio::test]
    async fn expired_slots_are_pruned_from_the_map() {
        let store = InMemoryRateLimitStore::new();
        let start = Instant::now();
        let r = rule(5, 30);
        for i in 0..50 {
            store.hit(&format!("client-{i}"), r, start).await;
        }
        // A hit after both the windows and the prune interval have passed
        // sweeps the dead slots.
        let later = start + Duration::from_secs(120);
        store.hit("fresh", r, later).await;
        let guard = store.windows.lock().await;
        assert_eq!(guard.slots.len(), 1);
    }
}
