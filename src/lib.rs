//! Floorwatch: an incremental relay for Bahamut forum threads
//!
//! This crate crawls paginated forum threads floor by floor, normalizes each
//! post into plain text, and forwards accepted posts to a publisher while
//! persisting a per-thread floor pointer so later runs resume where the last
//! one stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Floorwatch operations
#[derive(Debug, Error)]
pub enum FloorwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error for {url}: {source}")]
    Parse { url: String, source: ParseError },

    #[error("Publish error: {0}")]
    Publish(#[from] output::PublishError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TargetPhase,
        to: state::TargetPhase,
    },

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FloorwatchError {
    /// Returns true if the error means the local state can no longer be
    /// persisted, which ends the whole cycle rather than a single target.
    ///
    /// A target deleted while it was being crawled only ends that target.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Storage(storage::StorageError::TargetNotFound(_)) => false,
            Self::Storage(_) | Self::Database(_) => true,
            _ => false,
        }
    }

    /// Id of the target that disappeared from the store, if that is the error
    pub fn removed_target(&self) -> Option<i64> {
        match self {
            Self::Storage(storage::StorageError::TargetNotFound(id)) => Some(*id),
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a forum page
///
/// Every variant is retryable on the next cycle; none of them advances a
/// target's floor pointer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
}

/// Errors raised when forum markup no longer has the expected structure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The thread header is gone, usually because the thread was deleted or moved
    #[error("thread title not found")]
    MissingTitle,

    /// A post fragment lacks its header block or floor anchor
    #[error("post header not found")]
    MissingHeader,

    #[error("invalid floor number: {0:?}")]
    InvalidFloor(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] ::url::ParseError),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Floorwatch operations
pub type Result<T> = std::result::Result<T, FloorwatchError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlCursor, CrawlEngine, PostRecord};
pub use state::{CrawlTarget, TargetPhase};
