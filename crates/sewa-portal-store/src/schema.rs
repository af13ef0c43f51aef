// SPDX-License-Identifier: Apache-2.0

use crate::StoreError;
use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS amenity_requests (
             id            INTEGER PRIMARY KEY AUTOINCREMENT,
             reference_id  TEXT NOT NULL UNIQUE,
             name          TEXT NOT NULL,
             email         TEXT NOT NULL,
             phone         TEXT NOT NULL,
             district      TEXT NOT NULL,
             gpu           TEXT,
             location      TEXT NOT NULL,
             amenities     TEXT NOT NULL,
             other_amenity TEXT,
             description   TEXT NOT NULL,
             population    INTEGER,
             priority      TEXT NOT NULL,
             status        TEXT NOT NULL DEFAULT 'Pending',
             admin_notes   TEXT,
             submitted_at  TEXT NOT NULL,
             updated_at    TEXT
         );
         CREATE INDEX IF NOT EXISTS idx_requests_status ON amenity_requests(status);
         CREATE INDEX IF NOT EXISTS idx_requests_district ON amenity_requests(district);
         CREATE INDEX IF NOT EXISTS idx_requests_submitted_at ON amenity_requests(submitted_at);

         CREATE TABLE IF NOT EXISTS feedback_items (
             id            INTEGER PRIMARY KEY AUTOINCREMENT,
             reference_id  TEXT NOT NULL UNIQUE,
             name          TEXT NOT NULL,
             email         TEXT NOT NULL,
             phone         TEXT,
             district      TEXT,
             feedback_type TEXT NOT NULL,
             message       TEXT NOT NULL,
             status        TEXT NOT NULL DEFAULT 'New',
             admin_notes   TEXT,
             submitted_at  TEXT NOT NULL,
             updated_at    TEXT
         );
         CREATE INDEX IF NOT EXISTS idx_feedback_status ON feedback_items(status);
         CREATE INDEX IF NOT EXISTS idx_feedback_submitted_at ON feedback_items(submitted_at);

         CREATE TABLE IF NOT EXISTS admin_credentials (
             username      TEXT PRIMARY KEY,
             password_salt TEXT NOT NULL,
             password_hash TEXT NOT NULL
         );",
    )?;
    Ok(())
}
