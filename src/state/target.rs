//! Tracked thread definition

use std::fmt;

/// One forum thread configured for incremental crawling
///
/// `board_id` and `thread_id` (the forum's `bsn` and `snA`) identify the
/// thread. `last_floor` is the resume pointer: only the crawl engine moves it,
/// and only after a post was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Store row id (0 until the target has been stored)
    pub id: i64,

    /// Destination channel handed to the publisher
    pub channel_id: u64,

    pub board_id: u64,
    pub thread_id: u64,

    /// Highest floor already published
    pub last_floor: u32,

    /// Thread title cached from the first page of the current session
    pub title: String,

    /// Minimum approval score a post needs to be forwarded
    pub gp_threshold: u32,

    /// Disapproval score at which a post is dropped (0 disables the check)
    pub bp_threshold: u32,
}

impl CrawlTarget {
    /// Creates an unsaved target starting from the first floor
    pub fn new(channel_id: u64, board_id: u64, thread_id: u64) -> Self {
        Self {
            id: 0,
            channel_id,
            board_id,
            thread_id,
            last_floor: 0,
            title: String::new(),
            gp_threshold: 0,
            bp_threshold: 0,
        }
    }

    pub fn with_last_floor(mut self, last_floor: u32) -> Self {
        self.last_floor = last_floor;
        self
    }

    pub fn with_thresholds(mut self, gp_threshold: u32, bp_threshold: u32) -> Self {
        self.gp_threshold = gp_threshold;
        self.bp_threshold = bp_threshold;
        self
    }

    /// Short identity used in log lines and cycle summaries
    pub fn label(&self) -> String {
        format!("bsn={} snA={}", self.board_id, self.thread_id)
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "{}", self.label())
        } else {
            write!(f, "{} ({})", self.label(), self.title)
        }
    }
}
