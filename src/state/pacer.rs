use std::time::{Duration, Instant};

/// Spaces out requests to the forum
///
/// Tracks when the last request went out and how many were made, so the
/// fetcher can wait out the remainder of the minimum interval before the next
/// one.
#[derive(Debug, Clone)]
pub struct RequestPacer {
    /// Minimum time between two requests
    min_interval: Duration,

    /// Number of requests made through this pacer
    pub request_count: u32,

    /// Timestamp of the last request
    pub last_request_time: Option<Instant>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            request_count: 0,
            last_request_time: None,
        }
    }

    /// Records that a request was made
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
