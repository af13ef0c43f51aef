// SPDX-License-Identifier: Apache-2.0

use super::NotifyError;
use crate::config::NotifyConfig;
use sewa_portal_model::{AmenityRequest, District, RequestStatus};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram Bot API transport posting into district-specific groups.
pub(crate) struct ChatChannel {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    district_chats: HashMap<District, String>,
}

impl ChatChannel {
    pub(crate) fn from_config(config: &NotifyConfig) -> Option<Self> {
        let bot_token = config.telegram_bot_token.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            api_base: config.telegram_api_base.clone(),
            bot_token,
            district_chats: config.district_chats.clone(),
        })
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(&url)
            .timeout(SEND_TIMEOUT)
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .map_err(|e| NotifyError(format!("chat transport: {e}")))?;
        if !response.status().is_success() {
            return Err(NotifyError(format!(
                "chat transport returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn chat_for(&self, district: District) -> Result<&str, NotifyError> {
        self.district_chats
            .get(&district)
            .map(String::as_str)
            .ok_or_else(|| NotifyError(format!("no chat group mapped for district {district}")))
    }

    pub(crate) async fn send_new_request(&self, record: &AmenityRequest) -> Result<(), NotifyError> {
        let chat_id = self.chat_for(record.district)?;
        self.send(chat_id, &render_new_request(record)).await
    }

    pub(crate) async fn send_status_update(
        &self,
        record: &AmenityRequest,
        old_status: RequestStatus,
        new_status: RequestStatus,
    ) -> Result<(), NotifyError> {
        let chat_id = self.chat_for(record.district)?;
        self.send(chat_id, &render_status_update(record, old_status, new_status))
            .await
    }
}

/// "9812345670" becomes "98XXXXX670"; anything off-shape passes unchanged.
pub(crate) fn mask_phone(phone: &str) -> String {
    if phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}XXXXX{}", &phone[..2], &phone[7..])
    } else {
        phone.to_string()
    }
}

fn first_name(full: &str) -> &str {
    full.split_whitespace().next().unwrap_or(full)
}

pub(crate) fn render_new_request(record: &AmenityRequest) -> String {
    let amenities = record
        .amenities
        .iter()
        .map(|a| format!("  - {a}"))
        .collect::<Vec<_>>()
        .join("\n");
    let gpu_line = match &record.gpu {
        Some(gpu) => format!("<b>GPU:</b> {gpu}\n"),
        None => String::new(),
    };
    let population_line = match record.population {
        Some(population) => format!("<b>Population Benefiting:</b> {population}\n"),
        None => String::new(),
    };
    let description: String = if record.description.chars().count() > 150 {
        let truncated: String = record.description.chars().take(150).collect();
        format!("{truncated}...")
    } else {
        record.description.clone()
    };
    format!(
        "<b>New Amenity Request</b>\n\n\
         <b>District:</b> {district}\n\
         {gpu_line}\
         <b>Location:</b> {location}\n\
         <b>Submitted by:</b> {name} ({phone})\n\n\
         <b>Amenities Requested:</b>\n{amenities}\n\n\
         <b>Description:</b>\n{description}\n\n\
         {population_line}\
         <b>Priority:</b> {priority}\n\n\
         <b>Reference ID:</b> <code>{reference}</code>",
        district = record.district,
        location = record.location,
        name = first_name(&record.name),
        phone = mask_phone(&record.phone),
        priority = record.priority,
        reference = record.reference_id,
    )
}

pub(crate) fn render_status_update(
    record: &AmenityRequest,
    old_status: RequestStatus,
    new_status: RequestStatus,
) -> String {
    let notes_block = match &record.admin_notes {
        Some(notes) if !notes.is_empty() => format!("<b>Admin Message:</b>\n{notes}\n\n"),
        _ => String::new(),
    };
    format!(
        "<b>Request Status Update</b>\n\n\
         <b>Reference:</b> <code>{reference}</code>\n\
         <b>Location:</b> {location}\n\n\
         <b>Status Changed:</b>\n{old_status} -> <b>{new_status}</b>\n\n\
         {notes_block}",
        reference = record.reference_id,
        location = record.location,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sewa_portal_model::{Priority, ReferenceId};

    fn record() -> AmenityRequest {
        AmenityRequest {
            id: 1,
            reference_id: ReferenceId::parse("SKM123456789").expect("reference"),
            name: "Anita Rai".to_string(),
            email: "anita@example.com".to_string(),
            phone: "9812345670".to_string(),
            district: District::Namchi,
            gpu: Some("Maniram-Phalidara".to_string()),
            location: "Lower bazaar".to_string(),
            amenities: vec!["Healthcare".to_string()],
            other_amenity: None,
            description: "x".repeat(200),
            population: Some(300),
            priority: Priority::Medium,
            status: RequestStatus::Pending,
            admin_notes: None,
            submitted_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn group_messages_redact_contact_details() {
        let text = render_new_request(&record());
        assert!(text.contains("Anita (98XXXXX670)"));
        assert!(!text.contains("Rai"));
        assert!(!text.contains("9812345670"));
        assert!(!text.contains("anita@example.com"));
    }

    #[test]
    fn long_descriptions_are_truncated_for_the_group() {
        let text = render_new_request(&record());
        assert!(text.contains(&format!("{}...", "x".repeat(150))));
    }

    #[test]
    fn phone_masking_only_applies_to_well_formed_numbers() {
        assert_eq!(mask_phone("9812345670"), "98XXXXX670");
        assert_eq!(mask_phone("12345"), "12345");
    }

    #[test]
    fn status_updates_name_both_states() {
        let text = render_status_update(
            &record(),
            RequestStatus::Pending,
            RequestStatus::Completed,
        );
        assert!(text.contains("Pending -> <b>Completed</b>"));
    }
}
