//! Operator control over a running crawl
//!
//! Pausing stops the engine from starting another target; the target being
//! worked on finishes normally. Cancelling is permanent for the lifetime of
//! the control handle and interrupts fetches and delays, but never a publish
//! that has already been sent.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Shared pause flag and cancellation token
#[derive(Debug, Clone)]
pub struct CrawlControl {
    paused: Arc<watch::Sender<bool>>,
    cancel: CancellationToken,
}

impl CrawlControl {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            paused: Arc::new(paused),
            cancel: CancellationToken::new(),
        }
    }

    pub fn pause(&self) {
        if !self.paused.send_replace(true) {
            tracing::info!("Crawl paused");
        }
    }

    pub fn resume(&self) {
        if self.paused.send_replace(false) {
            tracing::info!("Crawl resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Crawl cancelled");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes once the crawl is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Completes once the crawl is paused or cancelled
    pub async fn interrupted(&self) {
        let mut paused = self.paused.subscribe();
        tokio::select! {
            _ = paused.wait_for(|paused| *paused) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    /// Sleeps for `duration` unless cancelled first
    ///
    /// Returns false if the sleep was cut short by a cancel.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}

impl Default for CrawlControl {
    fn default() -> Self {
        Self::new()
    }
}
