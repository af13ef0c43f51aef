// SPDX-License-Identifier: Apache-2.0

//! Request lifecycle engine: the only writer of `status`, `admin_notes` and
//! `updated_at`. Persists first, responds second, notifies third; the
//! notification leg runs on detached tasks and its outcome is invisible to
//! the submitting or updating caller.

use crate::notify::Notify;
use sewa_portal_api::{
    validate_feedback, validate_request, FieldError, RawFeedbackSubmission, RawRequestSubmission,
};
use sewa_portal_model::{
    AmenityRequest, District, FeedbackFilter, FeedbackItem, FeedbackStatus, NewFeedback,
    NewRequest, ReferenceId, RequestFilter, RequestStatus, FEEDBACK_PREFIX, REQUEST_PREFIX,
};
use sewa_portal_store::{PortalStore, StoreError, StoreStats};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::error;

#[derive(Debug)]
#[non_exhaustive]
pub enum EngineError {
    Validation(Vec<FieldError>),
    NotFound,
    Internal(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "validation failed ({} fields)", errors.len()),
            Self::NotFound => f.write_str("record not found"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A record found by public reference-code lookup.
#[derive(Debug, Clone)]
pub enum TrackedItem {
    Request(AmenityRequest),
    Feedback(FeedbackItem),
}

pub struct LifecycleEngine {
    store: Arc<PortalStore>,
    notifier: Arc<dyn Notify>,
}

impl LifecycleEngine {
    #[must_use]
    pub fn new(store: Arc<PortalStore>, notifier: Arc<dyn Notify>) -> Self {
        Self { store, notifier }
    }

    /// Runs a store closure off the async runtime threads.
    async fn with_store<T: Send + 'static>(
        &self,
        f: impl FnOnce(&PortalStore) -> Result<T, StoreError> + Send + 'static,
    ) -> Result<T, EngineError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| EngineError::Internal(format!("store task: {e}")))?
            .map_err(EngineError::from)
    }

    pub async fn submit_request(
        &self,
        raw: &RawRequestSubmission,
    ) -> Result<AmenityRequest, EngineError> {
        let input = validate_request(raw).map_err(EngineError::Validation)?;
        let record = self
            .with_store(move |store| insert_with_retry(store, &input))
            .await?;
        self.notifier.request_created(record.clone());
        Ok(record)
    }

    pub async fn submit_feedback(
        &self,
        raw: &RawFeedbackSubmission,
    ) -> Result<FeedbackItem, EngineError> {
        let input = validate_feedback(raw).map_err(EngineError::Validation)?;
        let record = self
            .with_store(move |store| insert_feedback_with_retry(store, &input))
            .await?;
        self.notifier.feedback_created(record.clone());
        Ok(record)
    }

    pub async fn get_request(&self, id: i64) -> Result<AmenityRequest, EngineError> {
        self.with_store(move |store| store.get_request(id))
            .await?
            .ok_or(EngineError::NotFound)
    }

    pub async fn list_requests(
        &self,
        filter: RequestFilter,
    ) -> Result<Vec<AmenityRequest>, EngineError> {
        self.with_store(move |store| store.list_requests(&filter))
            .await
    }

    /// Writes the new status and notes; a notification fires only when the
    /// status actually changed. Re-saving the same status is silent.
    pub async fn update_request(
        &self,
        id: i64,
        status: RequestStatus,
        admin_notes: Option<String>,
    ) -> Result<AmenityRequest, EngineError> {
        let previous = self
            .with_store(move |store| store.get_request(id))
            .await?
            .ok_or(EngineError::NotFound)?;

        let changed = self
            .with_store(move |store| store.update_request(id, status, admin_notes.as_deref()))
            .await?;
        if !changed {
            return Err(EngineError::NotFound);
        }

        let updated = self
            .with_store(move |store| store.get_request(id))
            .await?
            .ok_or_else(|| {
                EngineError::Internal("updated request row disappeared".to_string())
            })?;

        if previous.status != status {
            self.notifier
                .request_status_changed(updated.clone(), previous.status, status);
        }
        Ok(updated)
    }

    pub async fn delete_request(&self, id: i64) -> Result<(), EngineError> {
        let deleted = self
            .with_store(move |store| store.delete_request(id))
            .await?;
        if deleted {
            Ok(())
        } else {
            Err(EngineError::NotFound)
        }
    }

    pub async fn get_feedback(&self, id: i64) -> Result<FeedbackItem, EngineError> {
        self.with_store(move |store| store.get_feedback(id))
            .await?
            .ok_or(EngineError::NotFound)
    }

    pub async fn list_feedback(
        &self,
        filter: FeedbackFilter,
    ) -> Result<Vec<FeedbackItem>, EngineError> {
        self.with_store(move |store| store.list_feedback(&filter))
            .await
    }

    pub async fn update_feedback(
        &self,
        id: i64,
        status: FeedbackStatus,
        admin_notes: Option<String>,
    ) -> Result<FeedbackItem, EngineError> {
        let exists = self
            .with_store(move |store| store.get_feedback(id))
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::NotFound);
        }
        let changed = self
            .with_store(move |store| store.update_feedback(id, status, admin_notes.as_deref()))
            .await?;
        if !changed {
            return Err(EngineError::NotFound);
        }
        self.with_store(move |store| store.get_feedback(id))
            .await?
            .ok_or_else(|| EngineError::Internal("updated feedback row disappeared".to_string()))
    }

    pub async fn delete_feedback(&self, id: i64) -> Result<(), EngineError> {
        let deleted = self
            .with_store(move |store| store.delete_feedback(id))
            .await?;
        if deleted {
            Ok(())
        } else {
            Err(EngineError::NotFound)
        }
    }

    /// Public lookup by reference code, either record kind. Malformed codes
    /// report NotFound rather than echoing format detail back.
    pub async fn track(&self, raw_reference: &str) -> Result<TrackedItem, EngineError> {
        let Ok(reference) = ReferenceId::parse(raw_reference) else {
            return Err(EngineError::NotFound);
        };
        if reference.is_feedback() {
            let found = self
                .with_store(move |store| store.find_feedback_by_reference(&reference))
                .await?;
            found.map(TrackedItem::Feedback).ok_or(EngineError::NotFound)
        } else {
            let found = self
                .with_store(move |store| store.find_request_by_reference(&reference))
                .await?;
            found.map(TrackedItem::Request).ok_or(EngineError::NotFound)
        }
    }

    pub async fn recent_public(&self, limit: usize) -> Result<Vec<AmenityRequest>, EngineError> {
        self.with_store(move |store| store.recent_requests(limit))
            .await
    }

    pub async fn stats(&self) -> Result<StoreStats, EngineError> {
        self.with_store(|store| store.request_stats(None)).await
    }

    pub async fn district_overview(
        &self,
        district: District,
        limit: usize,
    ) -> Result<(Vec<AmenityRequest>, StoreStats), EngineError> {
        self.with_store(move |store| {
            let requests = store.recent_requests_for_district(district, limit)?;
            let stats = store.request_stats(Some(district))?;
            Ok((requests, stats))
        })
        .await
    }
}

/// One regeneration retry on a reference collision; at portal scale a second
/// collision in a row means something is wrong with the clock or RNG, and
/// the error surfaces as internal.
fn insert_with_retry(
    store: &PortalStore,
    input: &NewRequest,
) -> Result<AmenityRequest, StoreError> {
    let reference = ReferenceId::generate(REQUEST_PREFIX);
    match store.insert_request(input, &reference) {
        Err(StoreError::Constraint) => {
            error!(%reference, "reference collision; regenerating");
            let retry = ReferenceId::generate(REQUEST_PREFIX);
            store.insert_request(input, &retry)
        }
        other => other,
    }
}

fn insert_feedback_with_retry(
    store: &PortalStore,
    input: &NewFeedback,
) -> Result<FeedbackItem, StoreError> {
    let reference = ReferenceId::generate(FEEDBACK_PREFIX);
    match store.insert_feedback(input, &reference) {
        Err(StoreError::Constraint) => {
            error!(%reference, "reference collision; regenerating");
            let retry = ReferenceId::generate(FEEDBACK_PREFIX);
            store.insert_feedback(input, &retry)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingNotifier {
        created: AtomicUsize,
        status_changed: AtomicUsize,
        feedback_created: AtomicUsize,
    }

    impl Notify for CountingNotifier {
        fn request_created(&self, _record: AmenityRequest) {
            self.created.fetch_add(1, Ordering::SeqCst);
        }

        fn request_status_changed(
            &self,
            _record: AmenityRequest,
            _old_status: RequestStatus,
            _new_status: RequestStatus,
        ) {
            self.status_changed.fetch_add(1, Ordering::SeqCst);
        }

        fn feedback_created(&self, _record: FeedbackItem) {
            self.feedback_created.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn engine() -> (LifecycleEngine, Arc<CountingNotifier>) {
        let store = Arc::new(PortalStore::open_in_memory().expect("store"));
        let notifier = Arc::new(CountingNotifier::default());
        (
            LifecycleEngine::new(store, notifier.clone()),
            notifier,
        )
    }

    fn submission() -> RawRequestSubmission {
        RawRequestSubmission {
            name: Some("Anita Rai".to_string()),
            email: Some("anita@example.com".to_string()),
            phone: Some("9812345670".to_string()),
            district: Some("Gangtok".to_string()),
            gpu: None,
            location: Some("Ward 3".to_string()),
            amenities: Some(vec!["Water Supply".to_string()]),
            other_amenity: None,
            description: Some("No water for two weeks.".to_string()),
            population: None,
            priority: Some("High".to_string()),
        }
    }

    #[tokio::test]
    async fn submit_persists_pending_and_emits_one_created_event() {
        let (engine, notifier) = engine();
        let record = engine.submit_request(&submission()).await.expect("submit");
        assert_eq!(record.status, RequestStatus::Pending);
        assert!(record.updated_at.is_none());
        assert!(record.reference_id.as_str().starts_with("SKM"));
        assert_eq!(notifier.created.load(Ordering::SeqCst), 1);

        let tracked = engine
            .track(&record.reference_id.as_str().to_ascii_lowercase())
            .await
            .expect("track");
        match tracked {
            TrackedItem::Request(found) => assert_eq!(found.id, record.id),
            TrackedItem::Feedback(_) => panic!("request code resolved to feedback"),
        }
    }

    #[tokio::test]
    async fn invalid_submissions_persist_nothing() {
        let (engine, notifier) = engine();
        let raw = RawRequestSubmission {
            phone: Some("12345".to_string()),
            ..submission()
        };
        let err = engine.submit_request(&raw).await.expect_err("rejected");
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(notifier.created.load(Ordering::SeqCst), 0);
        assert!(engine
            .list_requests(RequestFilter::default())
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn status_change_notifies_exactly_once_and_resave_is_silent() {
        let (engine, notifier) = engine();
        let record = engine.submit_request(&submission()).await.expect("submit");

        let updated = engine
            .update_request(record.id, RequestStatus::Approved, Some("ok".to_string()))
            .await
            .expect("update");
        assert_eq!(updated.status, RequestStatus::Approved);
        assert!(updated.updated_at.is_some());
        assert_eq!(notifier.status_changed.load(Ordering::SeqCst), 1);

        // Idempotent re-save of the same status: still persisted, no event.
        engine
            .update_request(record.id, RequestStatus::Approved, Some("still ok".to_string()))
            .await
            .expect("re-save");
        assert_eq!(notifier.status_changed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_and_delete_report_not_found_for_unknown_ids() {
        let (engine, _) = engine();
        assert!(matches!(
            engine
                .update_request(404, RequestStatus::Approved, None)
                .await,
            Err(EngineError::NotFound)
        ));
        assert!(matches!(
            engine.delete_request(404).await,
            Err(EngineError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_makes_the_record_untrackable() {
        let (engine, _) = engine();
        let record = engine.submit_request(&submission()).await.expect("submit");
        engine.delete_request(record.id).await.expect("delete");
        assert!(matches!(
            engine.track(record.reference_id.as_str()).await,
            Err(EngineError::NotFound)
        ));
        assert!(matches!(
            engine.get_request(record.id).await,
            Err(EngineError::NotFound)
        ));
    }

    #[tokio::test]
    async fn feedback_submission_emits_its_own_event_kind() {
        let (engine, notifier) = engine();
        let raw = RawFeedbackSubmission {
            name: Some("Pema Sherpa".to_string()),
            email: Some("pema@example.com".to_string()),
            phone: None,
            district: None,
            feedback_type: Some("Suggestion".to_string()),
            message: Some("Please add evening bus service.".to_string()),
        };
        let record = engine.submit_feedback(&raw).await.expect("submit");
        assert_eq!(record.status, FeedbackStatus::New);
        assert!(record.reference_id.is_feedback());
        assert_eq!(notifier.feedback_created.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.created.load(Ordering::SeqCst), 0);

        let tracked = engine
            .track(record.reference_id.as_str())
            .await
            .expect("track feedback");
        assert!(matches!(tracked, TrackedItem::Feedback(_)));
    }

    #[tokio::test]
    async fn district_overview_scopes_counts_to_the_district() {
        let (engine, _) = engine();
        engine.submit_request(&submission()).await.expect("submit");
        let raw = RawRequestSubmission {
            district: Some("Mangan".to_string()),
            ..submission()
        };
        engine.submit_request(&raw).await.expect("submit");

        let (requests, stats) = engine
            .district_overview(District::Gangtok, 10)
            .await
            .expect("overview");
        assert_eq!(requests.len(), 1);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.pending, 1);
    }
}
