//! Target phase definitions for tracking crawl progress
//!
//! Each target moves through these phases once per cycle.

use std::fmt;

/// Represents where a target is within the current crawl cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetPhase {
    /// Not being crawled
    #[default]
    Idle,

    /// Fetching page 1 to learn the title and page count
    FetchingFirstPage,

    /// Fetching the pages of the current batch window
    FetchingBatch,

    /// Forwarding accepted posts in floor order
    Draining,

    /// Gave up on the target for this cycle; retried next cycle
    Failed,
}

impl TargetPhase {
    /// Returns true while the target has work in flight
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::FetchingFirstPage | Self::FetchingBatch | Self::Draining
        )
    }

    /// Returns true if moving from `self` to `next` is a legal step
    ///
    /// Any active phase may drop back to Idle, which is how an interrupted
    /// target is parked.
    pub fn can_transition_to(&self, next: TargetPhase) -> bool {
        use TargetPhase::*;

        match (self, next) {
            (Idle | Failed, FetchingFirstPage) => true,
            (FetchingFirstPage, FetchingBatch) => true,
            (FetchingBatch, Draining) => true,
            (from, Failed | Idle) if from.is_active() => true,
            (Failed, Idle) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingFirstPage => "fetching_first_page",
            Self::FetchingBatch => "fetching_batch",
            Self::Draining => "draining",
            Self::Failed => "failed",
        }
    }

}

impl fmt::Display for TargetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
