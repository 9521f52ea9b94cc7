//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::state_machine::Mode;
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound chat notices
#[async_trait]
pub trait NoticeSink: Send + Sync {
    /// Deliver `text` to a channel or a single identity
    async fn notify(&self, target: &str, text: &str) -> Result<(), String>;
}

/// Append-only record of registrations
#[async_trait]
pub trait WorkLog: Send + Sync {
    async fn record(&self, identity: &str, mode: Mode, goal: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: NoticeSink + ?Sized> NoticeSink for Arc<T> {
    async fn notify(&self, target: &str, text: &str) -> Result<(), String> {
        (**self).notify(target, text).await
    }
}

#[async_trait]
impl<T: WorkLog + ?Sized> WorkLog for Arc<T> {
    async fn record(&self, identity: &str, mode: Mode, goal: &str) -> Result<(), String> {
        (**self).record(identity, mode, goal).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;

/// Adapter to use Database as `WorkLog`
#[derive(Clone)]
pub struct DatabaseWorkLog {
    db: Database,
}

impl DatabaseWorkLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkLog for DatabaseWorkLog {
    async fn record(&self, identity: &str, mode: Mode, goal: &str) -> Result<(), String> {
        self.db
            .log_session(identity, mode, goal)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
