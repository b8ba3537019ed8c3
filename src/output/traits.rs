//! Publisher trait and types
//!
//! This module defines the trait interface for publishers, the requests they
//! accept, and the summary of a crawl cycle.

use crate::storage::CycleStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while publishing a post
///
/// None of these are fatal for the crawl: the post's floor is not advanced
/// and the same post is offered again next cycle.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publish rejected: {0}")]
    Rejected(String),

    #[error("Publisher unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

/// A tag the destination channel offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumTag {
    pub id: u64,
    pub name: String,
}

impl ForumTag {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Content of a publish request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishPayload {
    /// Info footer, separator and body in a single message
    Inline { text: String },

    /// Info footer as the message, full body as an attached file
    Attached {
        summary: String,
        file_name: String,
        file_body: String,
    },
}

/// One post, ready for the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Name of the new thread, `"{title} {floor}樓"`
    pub name: String,

    pub payload: PublishPayload,

    /// At most five tags, in the order the channel lists them
    pub applied_tags: Vec<ForumTag>,
}

/// Identifier of the published item, as reported by the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle(pub String);

impl std::fmt::Display for ThreadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination for accepted posts
///
/// Publishing is awaited before the crawl engine moves on, so posts arrive in
/// floor order.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the tag vocabulary of a channel
    async fn available_tags(&self, channel_id: u64) -> PublishResult<Vec<ForumTag>>;

    /// Publishes one post to a channel
    async fn publish(&self, channel_id: u64, request: PublishRequest)
        -> PublishResult<ThreadHandle>;
}

/// A target that could not be completed during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    /// Target identity, `bsn=.. snA=..`
    pub label: String,

    /// Error message
    pub reason: String,
}

/// Summary of one crawl cycle
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: CycleStatus,

    /// Targets the engine started working on
    pub targets_attempted: u32,

    /// Posts published
    pub posts_forwarded: u32,

    /// Posts rejected by the skip policy, already processed floors excluded
    pub posts_skipped: u32,

    pub failed_targets: Vec<TargetFailure>,
}

impl CycleSummary {
    /// Creates a summary for a cycle starting now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            status: CycleStatus::Running,
            targets_attempted: 0,
            posts_forwarded: 0,
            posts_skipped: 0,
            failed_targets: Vec::new(),
        }
    }

    /// Marks the cycle as finished now with the given status
    pub fn finish(&mut self, status: CycleStatus) {
        self.finished_at = Utc::now();
        self.status = status;
    }

    /// Records a target that failed for this cycle
    pub fn record_failure(&mut self, label: impl Into<String>, reason: impl ToString) {
        self.failed_targets.push(TargetFailure {
            label: label.into(),
            reason: reason.to_string(),
        });
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

impl Default for CycleSummary {
    fn default() -> Self {
        Self::new()
    }
}
