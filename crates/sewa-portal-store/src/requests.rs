// SPDX-License-Identifier: Apache-2.0

use crate::{PortalStore, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use sewa_portal_model::{
    AmenityRequest, District, NewRequest, Priority, ReferenceId, RequestFilter, RequestStatus,
};

pub(crate) fn encode_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("timestamp '{raw}': {e}")))
}

fn decode_row(row: &Row<'_>) -> Result<AmenityRequest, StoreError> {
    let get_text = |idx: usize| -> Result<String, StoreError> {
        row.get::<_, String>(idx).map_err(StoreError::from)
    };
    let reference_raw = get_text(1)?;
    let amenities_raw = get_text(8)?;
    let amenities: Vec<String> = serde_json::from_str(&amenities_raw)
        .map_err(|e| StoreError::Decode(format!("amenities '{amenities_raw}': {e}")))?;
    let district_raw = get_text(5)?;
    let priority_raw = get_text(12)?;
    let status_raw = get_text(13)?;
    let submitted_raw = get_text(15)?;
    let updated_raw: Option<String> = row.get(16)?;

    Ok(AmenityRequest {
        id: row.get(0)?,
        reference_id: ReferenceId::parse(&reference_raw)
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        name: get_text(2)?,
        email: get_text(3)?,
        phone: get_text(4)?,
        district: District::parse(&district_raw).map_err(|e| StoreError::Decode(e.to_string()))?,
        gpu: row.get(6)?,
        location: get_text(7)?,
        amenities,
        other_amenity: row.get(9)?,
        description: get_text(10)?,
        population: row.get(11)?,
        priority: Priority::parse(&priority_raw).map_err(|e| StoreError::Decode(e.to_string()))?,
        status: RequestStatus::parse(&status_raw)
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        admin_notes: row.get(14)?,
        submitted_at: decode_time(&submitted_raw)?,
        updated_at: match updated_raw {
            Some(raw) => Some(decode_time(&raw)?),
            None => None,
        },
    })
}

const SELECT_COLUMNS: &str = "id, reference_id, name, email, phone, district, gpu, location, \
     amenities, other_amenity, description, population, priority, status, admin_notes, \
     submitted_at, updated_at";

/// Aggregate counts for the dashboard and the public district pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub by_district: Vec<(String, i64)>,
    pub by_priority: Vec<(String, i64)>,
}

impl PortalStore {
    /// Persists a validated submission. The store assigns `id` and
    /// `submitted_at`; status starts Pending with no update timestamp.
    pub fn insert_request(
        &self,
        input: &NewRequest,
        reference: &ReferenceId,
    ) -> Result<AmenityRequest, StoreError> {
        let submitted_at = Utc::now();
        let amenities_json = serde_json::to_string(&input.amenities)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO amenity_requests
                     (reference_id, name, email, phone, district, gpu, location, amenities,
                      other_amenity, description, population, priority, status, admin_notes,
                      submitted_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, NULL, ?14, NULL)",
                params![
                    reference.as_str(),
                    input.name,
                    input.email,
                    input.phone,
                    input.district.as_str(),
                    input.gpu,
                    input.location,
                    amenities_json,
                    input.other_amenity,
                    input.description,
                    input.population,
                    input.priority.as_str(),
                    RequestStatus::Pending.as_str(),
                    encode_time(submitted_at),
                ],
            )?;
            let id = conn.last_insert_rowid();
            fetch_request(conn, id)?.ok_or_else(|| {
                StoreError::Sqlite("inserted request row disappeared".to_string())
            })
        })
    }

    pub fn get_request(&self, id: i64) -> Result<Option<AmenityRequest>, StoreError> {
        self.with_conn(|conn| fetch_request(conn, id))
    }

    pub fn find_request_by_reference(
        &self,
        reference: &ReferenceId,
    ) -> Result<Option<AmenityRequest>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM amenity_requests WHERE reference_id = ?1"
            ))?;
            let mut rows = stmt.query(params![reference.as_str()])?;
            match rows.next()? {
                Some(row) => Ok(Some(decode_row(row)?)),
                None => Ok(None),
            }
        })
    }

    /// Admin listing, newest submission first.
    pub fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<AmenityRequest>, StoreError> {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM amenity_requests");
        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(status) = filter.status {
            args.push(status.as_str().to_string());
            clauses.push(format!("status = ?{}", args.len()));
        }
        if let Some(district) = filter.district {
            args.push(district.as_str().to_string());
            clauses.push(format!("district = ?{}", args.len()));
        }
        if let Some(priority) = filter.priority {
            args.push(priority.as_str().to_string());
            clauses.push(format!("priority = ?{}", args.len()));
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

    /// Writes status, notes and the update timestamp; returns false when the
    /// id does not exist. The caller decides whether a notification is due.
    pub fn update_request(
        &self,
        id: i64,
        status: RequestStatus,
        admin_notes: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE amenity_requests SET status = ?1, admin_notes = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![
                    status.as_str(),
                    admin_notes,
                    encode_time(Utc::now()),
                    id
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_request(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM amenity_requests WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }

    pub fn recent_requests(&self, limit: usize) -> Result<Vec<AmenityRequest>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM amenity_requests
                 ORDER BY submitted_at DESC, id DESC LIMIT ?1"
            ))?;
            let mut rows = stmt.query(params![limit as i64])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(decode_row(row)?);
            }
            Ok(out)
        })
    }

    pub fn recent_requests_for_district(
        &self,
        district: District,
        limit: usize,
    ) -> Result<Vec<AmenityRequest>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM amenity_requests WHERE district = ?1
                 ORDER BY submitted_at DESC, id DESC LIMIT ?2"
            ))?;
            let mut rows = stmt.query(params![district.as_str(), limit as i64])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(decode_row(row)?);
            }
            Ok(out)
        })
    }

    /// Aggregates, optionally scoped to one district.
    pub fn request_stats(&self, district: Option<District>) -> Result<StoreStats, StoreError> {
        self.with_conn(|conn| {
            let scope = district.map(|d| d.as_str().to_string());
            let status_count = |status: RequestStatus| -> Result<i64, StoreError> {
                count_where(conn, Some(status.as_str()), scope.as_deref())
            };
            Ok(StoreStats {
                total: count_where(conn, None, scope.as_deref())?,
                pending: status_count(RequestStatus::Pending)?,
                approved: status_count(RequestStatus::Approved)?,
                rejected: status_count(RequestStatus::Rejected)?,
                by_district: group_counts(conn, "district", scope.as_deref())?,
                by_priority: group_counts(conn, "priority", scope.as_deref())?,
            })
        })
    }
}

fn fetch_request(conn: &Connection, id: i64) -> Result<Option<AmenityRequest>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM amenity_requests WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(decode_row(row)?)),
        None => Ok(None),
    }
}

fn count_where(
    conn: &Connection,
    status: Option<&str>,
    district: Option<&str>,
) -> Result<i64, StoreError> {
    let (sql, args): (String, Vec<&str>) = match (status, district) {
        (Some(s), Some(d)) => (
            "SELECT COUNT(*) FROM amenity_requests WHERE status = ?1 AND district = ?2".to_string(),
            vec![s, d],
        ),
        (Some(s), None) => (
            "SELECT COUNT(*) FROM amenity_requests WHERE status = ?1".to_string(),
            vec![s],
        ),
        (None, Some(d)) => (
            "SELECT COUNT(*) FROM amenity_requests WHERE district = ?1".to_string(),
            vec![d],
        ),
        (None, None) => ("SELECT COUNT(*) FROM amenity_requests".to_string(), vec![]),
    };
    let count = conn.query_row(&sql, rusqlite::params_from_iter(args.iter()), |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(count)
}

fn group_counts(
    conn: &Connection,
    column: &str,
    district: Option<&str>,
) -> Result<Vec<(String, i64)>, StoreError> {
    // `column` comes from the two internal call sites only, never from input.
    let sql = match district {
        Some(_) => format!(
            "SELECT {column}, COUNT(*) FROM amenity_requests WHERE district = ?1
             GROUP BY {column} ORDER BY {column}"
        ),
        None => format!(
            "SELECT {column}, COUNT(*) FROM amenity_requests GROUP BY {column} ORDER BY {column}"
        ),
    };
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match district {
        Some(d) => stmt.query(params![d])?,
        None => stmt.query([])?,
    };
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push((row.get::<_, String>(0)?, row.get::<_, i64>(1)?));
    }
    Ok(out)
}
