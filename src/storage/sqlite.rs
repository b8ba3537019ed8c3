//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the TargetStore trait.

use crate::output::CycleSummary;
use crate::state::CrawlTarget;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, TargetStore};
use crate::storage::{CycleRecord, CycleStatus};
use crate::FloorwatchError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite store for targets and cycle history
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(FloorwatchError)` - Failed to open database
    pub fn open(path: &Path) -> Result<Self, FloorwatchError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, FloorwatchError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn target_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlTarget> {
        Ok(CrawlTarget {
            id: row.get(0)?,
            channel_id: row.get(1)?,
            board_id: row.get(2)?,
            thread_id: row.get(3)?,
            last_floor: row.get(4)?,
            title: String::new(),
            gp_threshold: row.get(5)?,
            bp_threshold: row.get(6)?,
        })
    }

    fn cycle_from_row(row: &Row<'_>) -> rusqlite::Result<CycleRecord> {
        Ok(CycleRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: CycleStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(CycleStatus::Running),
            targets_attempted: row.get(5)?,
            posts_forwarded: row.get(6)?,
            posts_skipped: row.get(7)?,
            targets_failed: row.get(8)?,
        })
    }
}

impl TargetStore for SqliteStore {
    // ===== Targets =====

    fn load_targets(&self) -> StorageResult<Vec<CrawlTarget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, channel_id, board_id, thread_id, last_floor, gp_threshold, bp_threshold
             FROM targets ORDER BY id",
        )?;

        let targets = stmt
            .query_map([], Self::target_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(targets)
    }

    fn upsert_target(&mut self, target: &CrawlTarget) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO targets (channel_id, board_id, thread_id, last_floor, gp_threshold, bp_threshold)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(channel_id, board_id, thread_id) DO UPDATE SET
                 gp_threshold = excluded.gp_threshold,
                 bp_threshold = excluded.bp_threshold",
            params![
                target.channel_id,
                target.board_id,
                target.thread_id,
                target.last_floor,
                target.gp_threshold,
                target.bp_threshold
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM targets WHERE channel_id = ?1 AND board_id = ?2 AND thread_id = ?3",
            params![target.channel_id, target.board_id, target.thread_id],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn remove_target(&mut self, id: i64) -> StorageResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM targets WHERE id = ?1", params![id])?;

        if removed == 0 {
            return Err(StorageError::TargetNotFound(id));
        }
        Ok(())
    }

    fn update_last_floor(&mut self, id: i64, last_floor: u32) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE targets SET last_floor = ?1 WHERE id = ?2",
            params![last_floor, id],
        )?;

        if updated == 0 {
            return Err(StorageError::TargetNotFound(id));
        }
        Ok(())
    }

    fn save_targets(&mut self, targets: &[CrawlTarget]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE targets SET last_floor = ?1 WHERE id = ?2")?;
            for target in targets {
                // Targets removed while the cycle ran are skipped
                stmt.execute(params![target.last_floor, target.id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Cycles =====

    fn start_cycle(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO cycles (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, CycleStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_cycle(&mut self, cycle_id: i64, summary: &CycleSummary) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE cycles SET finished_at = ?1, status = ?2, targets_attempted = ?3,
                 posts_forwarded = ?4, posts_skipped = ?5, targets_failed = ?6
             WHERE id = ?7",
            params![
                summary.finished_at.to_rfc3339(),
                summary.status.to_db_string(),
                summary.targets_attempted,
                summary.posts_forwarded,
                summary.posts_skipped,
                summary.failed_targets.len() as u32,
                cycle_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::CycleNotFound(cycle_id));
        }
        Ok(())
    }

    fn recent_cycles(&self, limit: usize) -> StorageResult<Vec<CycleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status,
                    targets_attempted, posts_forwarded, posts_skipped, targets_failed
             FROM cycles ORDER BY id DESC LIMIT ?1",
        )?;

        let cycles = stmt
            .query_map(params![limit as i64], Self::cycle_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cycles)
    }
}

impl SqliteStore {
    /// Looks up a single target by id
    pub fn get_target(&self, id: i64) -> StorageResult<Option<CrawlTarget>> {
        let target = self
            .conn
            .query_row(
                "SELECT id, channel_id, board_id, thread_id, last_floor, gp_threshold, bp_threshold
                 FROM targets WHERE id = ?1",
                params![id],
                Self::target_from_row,
            )
            .optional()?;

        Ok(target)
    }
}
