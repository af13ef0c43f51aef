// SPDX-License-Identifier: Apache-2.0

use crate::requests::{decode_time, encode_time};
use crate::{PortalStore, StoreError};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use sewa_portal_model::{
    District, FeedbackFilter, FeedbackItem, FeedbackStatus, FeedbackType, NewFeedback, ReferenceId,
};

const SELECT_COLUMNS: &str = "id, reference_id, name, email, phone, district, feedback_type, \
     message, status, admin_notes, submitted_at, updated_at";

fn decode_row(row: &Row<'_>) -> Result<FeedbackItem, StoreError> {
    let reference_raw: String = row.get(1)?;
    let district_raw: Option<String> = row.get(5)?;
    let type_raw: String = row.get(6)?;
    let status_raw: String = row.get(8)?;
    let submitted_raw: String = row.get(10)?;
    let updated_raw: Option<String> = row.get(11)?;

    Ok(FeedbackItem {
        id: row.get(0)?,
        reference_id: ReferenceId::parse(&reference_raw)
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        district: match district_raw {
            Some(raw) => {
                Some(District::parse(&raw).map_err(|e| StoreError::Decode(e.to_string()))?)
            }
            None => None,
        },
        feedback_type: FeedbackType::parse(&type_raw)
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        message: row.get(7)?,
        status: FeedbackStatus::parse(&status_raw)
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        admin_notes: row.get(9)?,
        submitted_at: decode_time(&submitted_raw)?,
        updated_at: match updated_raw {
            Some(raw) => Some(decode_time(&raw)?),
            None => None,
        },
    })
}

fn fetch_feedback(conn: &Connection, id: i64) -> Result<Option<FeedbackItem>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM feedback_items WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(decode_row(row)?)),
        None => Ok(None),
    }
}

impl PortalStore {
    pub fn insert_feedback(
        &self,
        input: &NewFeedback,
        reference: &ReferenceId,
    ) -> Result<FeedbackItem, StoreError> {
        let submitted_at = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO feedback_items
                     (reference_id, name, email, phone, district, feedback_type, message,
                      status, admin_notes, submitted_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, NULL)",
                params![
                    reference.as_str(),
                    input.name,
                    input.email,
                    input.phone,
                    input.district.map(|d| d.as_str()),
                    input.feedback_type.as_str(),
                    input.message,
                    FeedbackStatus::New.as_str(),
                    encode_time(submitted_at),
                ],
            )?;
            let id = conn.last_insert_rowid();
            fetch_feedback(conn, id)?.ok_or_else(|| {
                StoreError::Sqlite("inserted feedback row disappeared".to_string())
            })
        })
    }

    pub fn get_feedback(&self, id: i64) -> Result<Option<FeedbackItem>, StoreError> {
        self.with_conn(|conn| fetch_feedback(conn, id))
    }

    pub fn find_feedback_by_reference(
        &self,
        reference: &ReferenceId,
    ) -> Result<Option<FeedbackItem>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM feedback_items WHERE reference_id = ?1"
            ))?;
            let mut rows = stmt.query(params![reference.as_str()])?;
            match rows.next()? {
                Some(row) => Ok(Some(decode_row(row)?)),
                None => Ok(None),
            }
        })
    }

    pub fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackItem>, StoreError> {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM feedback_items");
        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(status) = filter.status {
            args.push(status.as_str().to_string());
            clauses.push(format!("status = ?{}", args.len()));
        }
        if let Some(ty) = filter.feedback_type {
            args.push(ty.as_str().to_string());
            clauses.push(format!("feedback_type = ?{}", args.len()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY submitted_at DESC, id DESC");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params_from_iter(args.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(decode_row(row)?);
            }
            Ok(out)
        })
    }

    pub fn update_feedback(
        &self,
        id: i64,
        status: FeedbackStatus,
        admin_notes: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE feedback_items SET status = ?1, admin_notes = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![status.as_str(), admin_notes, encode_time(Utc::now()), id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_feedback(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM feedback_items WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }
}
