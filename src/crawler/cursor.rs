//! Floor and page arithmetic for incremental crawling

use std::ops::Range;

/// Number of posts the forum shows on one thread page
pub const POSTS_PER_PAGE: u32 = 20;

/// Position of a target within its thread, derived from `last_floor`
///
/// Floors are numbered from 1; page `p` holds floors
/// `(p - 1) * 20 + 1 ..= p * 20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCursor {
    pub last_floor: u32,
}

impl CrawlCursor {
    pub fn new(last_floor: u32) -> Self {
        Self { last_floor }
    }

    /// First floor that has not been processed yet
    pub fn start_floor(&self) -> u32 {
        self.last_floor.saturating_add(1)
    }

    /// Page holding `start_floor`
    pub fn start_page(&self) -> u32 {
        self.last_floor / POSTS_PER_PAGE + 1
    }

    /// Pages to fetch in one batch
    ///
    /// Starts at `start_page` and covers at most `batch_size` pages, never
    /// running past `total_pages`. The range is empty once the cursor has
    /// caught up with the end of the thread.
    pub fn page_window(&self, total_pages: u32, batch_size: u32) -> Range<u32> {
        let start = self.start_page();
        let end = total_pages
            .saturating_add(1)
            .min(start.saturating_add(batch_size));
        start..end.max(start)
    }

    /// Returns true if `floor` was already processed
    pub fn is_processed(&self, floor: u32) -> bool {
        floor < self.start_floor()
    }
}
