//! API response types

use crate::db::WorkLogEntry;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WorkLogResponse {
    pub nick: String,
    pub sessions: Vec<WorkLogEntry>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
