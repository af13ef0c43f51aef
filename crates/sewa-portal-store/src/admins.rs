// SPDX-License-Identifier: Apache-2.0

use crate::{PortalStore, StoreError};
use rusqlite::params;

/// Credential at rest: a per-user random salt and the salted one-way hash.
/// Plaintext passwords never touch the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredential {
    pub username: String,
    pub password_salt: String,
    pub password_hash: String,
}

impl PortalStore {
    pub fn upsert_admin(&self, credential: &AdminCredential) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO admin_credentials (username, password_salt, password_hash)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO UPDATE SET
                     password_salt = excluded.password_salt,
                     password_hash = excluded.password_hash",
                params![
                    credential.username,
                    credential.password_salt,
                    credential.password_hash
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_admin(&self, username: &str) -> Result<Option<AdminCredential>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, password_salt, password_hash FROM admin_credentials
                 WHERE username = ?1",
            )?;
            let mut rows = stmt.query(params![username])?;
            match rows.next()? {
                Some(row) => Ok(Some(AdminCredential {
                    username: row.get(0)?,
                    password_salt: row.get(1)?,
                    password_hash: row.get(2)?,
                })),
                None => Ok(None),
            }
        })
    }

    pub fn admin_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.get_admin(username)?.is_some())
    }
}
