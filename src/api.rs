//! HTTP API serving exported work logs

mod handlers;
mod types;

pub use handlers::create_router;

use crate::db::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}
