//! Database schema and types

use crate::state_machine::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS work_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nick TEXT NOT NULL,
    mode TEXT NOT NULL,
    goal TEXT NOT NULL,
    logged_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_work_log_nick ON work_log(nick, id);
";

/// One registration in a user's work log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLogEntry {
    pub logged_at: DateTime<Utc>,
    pub mode: Mode,
    pub goal: String,
}
