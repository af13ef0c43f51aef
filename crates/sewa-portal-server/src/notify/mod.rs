// SPDX-License-Identifier: Apache-2.0

//! Best-effort notification fan-out. The lifecycle engine emits one-way
//! events through the `Notify` trait; the dispatcher delivers them on
//! detached tasks so no transport failure, timeout, or misconfiguration can
//! ever reach the HTTP caller.

mod chat;
mod email;

pub(crate) use chat::ChatChannel;
pub(crate) use email::EmailChannel;

use crate::config::NotifyConfig;
use sewa_portal_model::{AmenityRequest, FeedbackItem, RequestStatus};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub(crate) struct NotifyError(pub String);

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for NotifyError {}

/// One-way event sink. Implementations must not block the caller and must
/// swallow their own failures.
pub trait Notify: Send + Sync {
    fn request_created(&self, record: AmenityRequest);
    fn request_status_changed(
        &self,
        record: AmenityRequest,
        old_status: RequestStatus,
        new_status: RequestStatus,
    );
    fn feedback_created(&self, record: FeedbackItem);
}

/// Delivers through the email and chat channels independently; a failure on
/// one never affects the other.
pub struct Dispatcher {
    email: Option<Arc<EmailChannel>>,
    chat: Option<Arc<ChatChannel>>,
}

impl Dispatcher {
    #[must_use]
    pub fn from_config(config: &NotifyConfig) -> Self {
        let email = EmailChannel::from_config(config).map(Arc::new);
        if email.is_none() {
            info!("email transport not configured; confirmation mail disabled");
        }
        let chat = ChatChannel::from_config(config).map(Arc::new);
        if chat.is_none() {
            info!("chat transport not configured; district notifications disabled");
        }
        Self { email, chat }
    }
}

impl Notify for Dispatcher {
    fn request_created(&self, record: AmenityRequest) {
        if let Some(channel) = self.email.clone() {
            let record = record.clone();
            tokio::spawn(async move {
                if let Err(e) = channel.send_request_confirmation(&record).await {
                    warn!(reference = %record.reference_id, "confirmation email failed: {e}");
                }
            });
        }
        if let Some(channel) = self.chat.clone() {
            tokio::spawn(async move {
                if let Err(e) = channel.send_new_request(&record).await {
                    warn!(reference = %record.reference_id, "chat notification failed: {e}");
                }
            });
        }
    }

    fn request_status_changed(
        &self,
        record: AmenityRequest,
        old_status: RequestStatus,
        new_status: RequestStatus,
    ) {
        if let Some(channel) = self.email.clone() {
            let record = record.clone();
            tokio::spawn(async move {
                if let Err(e) = channel
                    .send_status_update(&record, old_status, new_status)
                    .await
                {
                    warn!(reference = %record.reference_id, "status email failed: {e}");
                }
            });
        }
        if let Some(channel) = self.chat.clone() {
            tokio::spawn(async move {
                if let Err(e) = channel
                    .send_status_update(&record, old_status, new_status)
                    .await
                {
                    warn!(reference = %record.reference_id, "chat status update failed: {e}");
                }
            });
        }
    }

    fn feedback_created(&self, record: FeedbackItem) {
        if let Some(channel) = self.email.clone() {
            tokio::spawn(async move {
                if let Err(e) = channel.send_feedback_receipt(&record).await {
                    warn!(reference = %record.reference_id, "feedback receipt email failed: {e}");
                }
            });
        }
    }
}
