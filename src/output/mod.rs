//! Output module for publishing accepted posts and reporting cycles
//!
//! This module handles:
//! - The publisher interface and its request types
//! - Packaging posts into publish requests
//! - Archiving posts to a local directory
//! - Formatting cycle summaries and history

mod directory;
pub mod packager;
pub mod stats;
mod traits;

pub use directory::{DirectoryPublisher, MESSAGE_FILE};
pub use packager::{package_post, ATTACHMENT_NAME, INLINE_LIMIT, MAX_APPLIED_TAGS, SEPARATOR};
pub use stats::{print_history, print_summary};
pub use traits::{
    CycleSummary, ForumTag, PublishError, PublishPayload, PublishRequest, PublishResult,
    Publisher, TargetFailure, ThreadHandle,
};
