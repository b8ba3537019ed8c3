//! Storage module for persisting crawl state
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Tracked targets and their floor pointers
//! - Cycle history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, TargetStore};

use crate::config::Config;
use crate::FloorwatchError;

use std::path::Path;

/// Opens the store named in the configuration and upserts its seed targets
///
/// # Arguments
///
/// * `config` - The loaded configuration
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Store ready for the crawl engine
/// * `Err(FloorwatchError)` - Failed to open the database or write the seeds
pub fn open_store(config: &Config) -> Result<SqliteStore, FloorwatchError> {
    let mut store = SqliteStore::open(Path::new(&config.storage.database_path))?;

    for entry in &config.targets {
        let id = store.upsert_target(&entry.to_target())?;
        tracing::debug!(
            "Seeded target {} (bsn={} snA={})",
            id,
            entry.board_id,
            entry.thread_id
        );
    }

    Ok(store)
}

/// Represents a crawl cycle in the database
#[derive(Debug, Clone)]
pub struct CycleRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: CycleStatus,
    pub targets_attempted: u32,
    pub posts_forwarded: u32,
    pub posts_skipped: u32,
    pub targets_failed: u32,
}

/// Status of a crawl cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Running,
    Completed,
    /// An operator pause stopped the cycle between targets
    Paused,
    /// An operator cancel stopped the cycle between posts or pages
    Cancelled,
    /// Local state could not be persisted
    Failed,
}

impl CycleStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "paused" => Some(Self::Paused),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
