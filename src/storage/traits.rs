//! Storage traits and error types
//!
//! This module defines the trait interface for the target store and
//! associated error types.

use crate::output::CycleSummary;
use crate::state::CrawlTarget;
use crate::storage::CycleRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Target not found: {0}")]
    TargetNotFound(i64),

    #[error("Cycle not found: {0}")]
    CycleNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent home of the tracked targets and the cycle history
///
/// The row layout of a target is fixed: `channel_id, board_id, thread_id,
/// last_floor, gp_threshold, bp_threshold`. The crawl engine writes
/// `last_floor` through `update_last_floor` only.
pub trait TargetStore {
    // ===== Targets =====

    /// Loads every tracked target, ordered by id
    fn load_targets(&self) -> StorageResult<Vec<CrawlTarget>>;

    /// Inserts a target or refreshes the thresholds of an existing one
    ///
    /// An existing target keeps its `last_floor`, so re-reading a config file
    /// never rewinds progress.
    ///
    /// # Returns
    ///
    /// The id of the inserted or updated target
    fn upsert_target(&mut self, target: &CrawlTarget) -> StorageResult<i64>;

    /// Removes a target
    fn remove_target(&mut self, id: i64) -> StorageResult<()>;

    /// Persists a new resume pointer for one target
    fn update_last_floor(&mut self, id: i64, last_floor: u32) -> StorageResult<()>;

    /// Persists the resume pointers of all given targets in one transaction
    fn save_targets(&mut self, targets: &[CrawlTarget]) -> StorageResult<()>;

    // ===== Cycles =====

    /// Opens a cycle record and returns its id
    fn start_cycle(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Closes a cycle record with its final counts
    fn finish_cycle(&mut self, cycle_id: i64, summary: &CycleSummary) -> StorageResult<()>;

    /// Returns the most recent cycles, newest first
    fn recent_cycles(&self, limit: usize) -> StorageResult<Vec<CycleRecord>>;
}
