//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlTarget`: a tracked thread and its resume pointer
//! - `TargetPhase`: where a target is within the current cycle
//! - `RequestPacer`: spacing between requests to the forum

mod pacer;
mod phase;
mod target;

pub use pacer::RequestPacer;
pub use phase::TargetPhase;
pub use target::CrawlTarget;
