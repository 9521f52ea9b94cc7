//! Work log persistence
//!
//! Every registration is appended to the registering user's log, keyed by
//! the lowercased nick so exports do not depend on how the nick was typed.

mod schema;

pub use schema::*;

use crate::state_machine::Mode;
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Could not create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Work Log Operations ====================

    /// Append a registration to `nick`'s work log
    pub fn log_session(&self, nick: &str, mode: Mode, goal: &str) -> DbResult<WorkLogEntry> {
        let conn = self.conn()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO work_log (nick, mode, goal, logged_at) VALUES (?1, ?2, ?3, ?4)",
            params![nick.to_lowercase(), mode.name(), goal, now.to_rfc3339()],
        )?;

        Ok(WorkLogEntry {
            logged_at: now,
            mode,
            goal: goal.to_string(),
        })
    }

    /// All entries for `nick`, oldest first. Unknown nicks have an empty log.
    pub fn work_log(&self, nick: &str) -> DbResult<Vec<WorkLogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT logged_at, mode, goal FROM work_log WHERE nick = ?1 ORDER BY id")?;

        let rows = stmt.query_map(params![nick.to_lowercase()], |row| {
            let logged_at: String = row.get(0)?;
            let mode: String = row.get(1)?;
            let mode = mode.parse::<Mode>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
            })?;
            Ok(WorkLogEntry {
                logged_at: parse_datetime(&logged_at),
                mode,
                goal: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
