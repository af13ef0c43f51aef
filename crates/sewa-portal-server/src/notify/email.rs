// SPDX-License-Identifier: Apache-2.0

use super::NotifyError;
use crate::config::NotifyConfig;
use sewa_portal_model::{AmenityRequest, FeedbackItem, RequestStatus};
use serde_json::json;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// SendGrid `mail/send` transport. Plain-text bodies only.
pub(crate) struct EmailChannel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    base_url: Option<String>,
}

impl EmailChannel {
    pub(crate) fn from_config(config: &NotifyConfig) -> Option<Self> {
        let api_key = config.sendgrid_api_key.clone()?;
        let from = config.email_from.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            endpoint: config.sendgrid_endpoint.clone(),
            api_key,
            from,
            base_url: config.public_base_url.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError(format!("mail transport: {e}")))?;
        if !response.status().is_success() {
            return Err(NotifyError(format!(
                "mail transport returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    pub(crate) async fn send_request_confirmation(
        &self,
        record: &AmenityRequest,
    ) -> Result<(), NotifyError> {
        let subject = format!("Request Received - Ref: {}", record.reference_id);
        let body = render_confirmation(record, self.base_url.as_deref());
        self.send(&record.email, &subject, &body).await
    }

    pub(crate) async fn send_status_update(
        &self,
        record: &AmenityRequest,
        old_status: RequestStatus,
        new_status: RequestStatus,
    ) -> Result<(), NotifyError> {
        let subject = format!("[Status Update] Your Request - Ref: {}", record.reference_id);
        let body = render_status_update(record, old_status, new_status, self.base_url.as_deref());
        self.send(&record.email, &subject, &body).await
    }

    pub(crate) async fn send_feedback_receipt(
        &self,
        record: &FeedbackItem,
    ) -> Result<(), NotifyError> {
        let subject = format!("Feedback Received - Ref: {}", record.reference_id);
        let body = render_feedback_receipt(record);
        self.send(&record.email, &subject, &body).await
    }
}

fn tracking_line(base_url: Option<&str>) -> String {
    match base_url {
        Some(base) => format!("Track your request anytime: {base}/#track\n\n"),
        None => String::new(),
    }
}

/// What the citizen should expect next, per status.
const fn status_guidance(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "We are reviewing your request and will update you soon.",
        RequestStatus::InProgress => {
            "Our team is actively working on your request. A survey or assessment may be conducted soon."
        }
        RequestStatus::Approved => {
            "Great news! Your request has been approved and will move to the next phase of implementation."
        }
        RequestStatus::Rejected => {
            "Unfortunately, your request cannot be fulfilled at this time. Please see the notes below for details."
        }
        RequestStatus::Completed => "Your request has been completed! Thank you for your patience.",
    }
}

pub(crate) fn render_confirmation(record: &AmenityRequest, base_url: Option<&str>) -> String {
    let amenities = record
        .amenities
        .iter()
        .map(|a| format!("  - {a}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Dear {name},\n\n\
         Thank you for submitting your amenity request for {district}!\n\n\
         Your Reference ID: {reference}\n\n\
         Location: {location}\n\
         Amenities Requested:\n{amenities}\n\
         Priority: {priority}\n\
         Status: {status}\n\n\
         {tracking}\
         You will receive email updates when your request status changes.\n",
        name = record.name,
        district = record.district,
        reference = record.reference_id,
        location = record.location,
        priority = record.priority,
        status = record.status,
        tracking = tracking_line(base_url),
    )
}

pub(crate) fn render_status_update(
    record: &AmenityRequest,
    old_status: RequestStatus,
    new_status: RequestStatus,
    base_url: Option<&str>,
) -> String {
    let notes = match &record.admin_notes {
        Some(notes) if !notes.is_empty() => {
            format!("Message from our team:\n{notes}\n\n")
        }
        _ => String::new(),
    };
    format!(
        "Dear {name},\n\n\
         Your amenity request for {district} has been updated.\n\n\
         Reference ID: {reference}\n\n\
         Previous Status: {old_status}\n\
         New Status: {new_status}\n\n\
         {guidance}\n\n\
         {notes}\
         Location: {location}\n\n\
         {tracking}",
        name = record.name,
        district = record.district,
        reference = record.reference_id,
        guidance = status_guidance(new_status),
        location = record.location,
        tracking = tracking_line(base_url),
    )
}

pub(crate) fn render_feedback_receipt(record: &FeedbackItem) -> String {
    format!(
        "Dear {name},\n\n\
         Thank you for your {kind} feedback.\n\n\
         Your Reference ID: {reference}\n\n\
         Our team reads every submission; you will hear from us if follow-up\n\
         is needed.\n",
        name = record.name,
        kind = record.feedback_type,
        reference = record.reference_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sewa_portal_model::{District, Priority, ReferenceId};

    fn record() -> AmenityRequest {
        AmenityRequest {
            id: 1,
            reference_id: ReferenceId::parse("SKM123456789").expect("reference"),
            name: "Anita Rai".to_string(),
            email: "anita@example.com".to_string(),
            phone: "9812345670".to_string(),
            district: District::Gangtok,
            gpu: None,
            location: "Ward 3".to_string(),
            amenities: vec!["Water Supply".to_string(), "Street Lights".to_string()],
            other_amenity: None,
            description: "No water for two weeks.".to_string(),
            population: None,
            priority: Priority::High,
            status: RequestStatus::Pending,
            admin_notes: None,
            submitted_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn confirmation_names_the_reference_and_every_amenity() {
        let body = render_confirmation(&record(), Some("https://portal.example"));
        assert!(body.contains("SKM123456789"));
        assert!(body.contains("- Water Supply"));
        assert!(body.contains("- Street Lights"));
        assert!(body.contains("https://portal.example/#track"));
    }

    #[test]
    fn status_update_shows_both_states_and_notes_when_present() {
        let mut updated = record();
        updated.status = RequestStatus::Approved;
        updated.admin_notes = Some("Work order issued.".to_string());
        let body = render_status_update(
            &updated,
            RequestStatus::Pending,
            RequestStatus::Approved,
            None,
        );
        assert!(body.contains("Previous Status: Pending"));
        assert!(body.contains("New Status: Approved"));
        assert!(body.contains("Work order issued."));
        assert!(body.contains("has been approved"));
    }

    #[test]
    fn status_update_omits_the_notes_block_when_empty() {
        let body = render_status_update(
            &record(),
            RequestStatus::Pending,
            RequestStatus::InProgress,
            None,
        );
        assert!(!body.contains("Message from our team"));
    }
}
