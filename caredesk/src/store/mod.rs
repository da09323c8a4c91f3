//! SQLite-backed persistence for users, elders and care records.
//!
//! A single connection sits behind a mutex; every call takes the lock for the
//! duration of one statement or transaction.

mod accounts;
mod elders;
mod records;

pub use accounts::NewUser;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};
use wards::{AccessScope, ElderDirectory, ElderRef};

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Stored text did not match any known choice.
#[derive(Debug, Error)]
#[error("unknown choice `{0}`")]
pub(crate) struct UnknownChoice(String);

pub(crate) fn parse_choice<T>(
    idx: usize,
    raw: String,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(UnknownChoice(raw)),
        )
    })
}

pub struct CareStore {
    conn: Mutex<Connection>,
}

impl CareStore {
    /// Open or create a database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!("Opening care store at {}", path.display());
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Journal mode {}", mode);
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory care store");
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ElderDirectory for CareStore {
    type Error = StoreError;

    fn elders_in(&self, scope: &AccessScope) -> Result<Vec<ElderRef>, Self::Error> {
        Ok(self
            .elders(scope)?
            .into_iter()
            .map(|elder| elder.elder_ref())
            .collect())
    }
}
