//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Floorwatch database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Tracked threads and their resume pointers
CREATE TABLE IF NOT EXISTS targets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id INTEGER NOT NULL,
    board_id INTEGER NOT NULL,
    thread_id INTEGER NOT NULL,
    last_floor INTEGER NOT NULL DEFAULT 0 CHECK (last_floor >= 0),
    gp_threshold INTEGER NOT NULL DEFAULT 0,
    bp_threshold INTEGER NOT NULL DEFAULT 0,
    UNIQUE(channel_id, board_id, thread_id)
);

-- Crawl cycle history
CREATE TABLE IF NOT EXISTS cycles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    targets_attempted INTEGER NOT NULL DEFAULT 0,
    posts_forwarded INTEGER NOT NULL DEFAULT 0,
    posts_skipped INTEGER NOT NULL DEFAULT 0,
    targets_failed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_cycles_started ON cycles(started_at);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
