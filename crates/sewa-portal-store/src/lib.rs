#![forbid(unsafe_code)]
//! Persistence adapter over SQLite. Owns record `id` and `submitted_at`
//! assignment and the `reference_id` UNIQUE constraint that backstops the
//! reference-code generator.

use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

mod admins;
mod feedback;
mod requests;
mod schema;

pub use admins::AdminCredential;
pub use requests::StoreStats;

#[derive(Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write; for reference codes the
    /// caller regenerates and retries.
    Constraint,
    /// A stored value no longer parses as its domain type.
    Decode(String),
    Sqlite(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constraint => f.write_str("unique constraint violated"),
            Self::Decode(msg) => write!(f, "stored row failed to decode: {msg}"),
            Self::Sqlite(msg) => write!(f, "sqlite error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Constraint
            }
            _ => Self::Sqlite(err.to_string()),
        }
    }
}

/// Single-connection store. SQLite serialises row mutations; the mutex
/// serialises statement use across tasks. Callers in async context go
/// through `spawn_blocking`.
pub struct PortalStore {
    conn: Mutex<Connection>,
}

impl PortalStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000; PRAGMA foreign_keys=ON;",
        )?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::Sqlite("connection mutex poisoned".to_string()))?;
        f(&guard)
    }
}
