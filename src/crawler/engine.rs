//! Crawl engine - incremental crawl orchestration
//!
//! Each cycle walks the tracked targets one after another. For every target
//! the engine:
//! 1. Probes page 1 for the thread title and page count
//! 2. Fetches the window of pages after the target's resume point
//! 3. Drains the fetched posts in floor order through the skip policy
//! 4. Publishes accepted posts, persisting `last_floor` after each one
//!
//! A failing target is recorded and the cycle moves on to the next one. Only
//! storage failures end the cycle early.

use crate::crawler::control::CrawlControl;
use crate::crawler::cursor::CrawlCursor;
use crate::crawler::fetcher::PageSource;
use crate::crawler::page::{parse_page, ParsedPage};
use crate::crawler::post::{parse_post, PostRecord};
use crate::config::CrawlerConfig;
use crate::output::{package_post, CycleSummary, ForumTag, Publisher};
use crate::state::{CrawlTarget, TargetPhase};
use crate::storage::{CycleStatus, TargetStore};
use crate::{FloorwatchError, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Tunables of the crawl engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Pages fetched per target per cycle
    pub pages_per_batch: u32,

    /// Pause after every published post
    pub post_delay: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            pages_per_batch: config.pages_per_batch,
            post_delay: Duration::from_millis(config.post_delay),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// What page 1 of a thread says about the thread
#[derive(Debug, Clone)]
pub struct ThreadProbe {
    pub title: String,
    pub total_pages: u32,

    /// URL and parse of page 1, reused when the window starts there
    pub first_page_url: String,
    pub first_page: ParsedPage,
}

/// Posts of one fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub number: u32,
    pub url: String,
    pub posts: Vec<PostRecord>,
}

/// Result of fetching a page window
///
/// Pages before the first failure are kept so they can still be drained.
#[derive(Debug)]
pub struct WindowFetch {
    pub pages: Vec<FetchedPage>,

    /// Error that ended the batch early
    pub error: Option<FloorwatchError>,
}

/// Why the skip policy passed over a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Floor is at or below `last_floor`
    AlreadyProcessed,

    /// Approval score below `gp_threshold`
    BelowApproval,

    /// Disapproval score at or above a non-zero `bp_threshold`
    AboveDisapproval,
}

/// Decides whether a post is skipped for a target
///
/// Returns None when the post should be published.
pub fn skip_reason(target: &CrawlTarget, post: &PostRecord) -> Option<SkipReason> {
    if CrawlCursor::new(target.last_floor).is_processed(post.floor) {
        return Some(SkipReason::AlreadyProcessed);
    }

    if post.approval_score < target.gp_threshold {
        return Some(SkipReason::BelowApproval);
    }

    if target.bp_threshold > 0 && post.disapproval_score >= target.bp_threshold {
        return Some(SkipReason::AboveDisapproval);
    }

    None
}

/// How a target's turn in the cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetOutcome {
    Finished,
    Interrupted,
}

/// Incremental crawl engine
pub struct CrawlEngine<F, P, S> {
    settings: EngineSettings,
    fetcher: F,
    publisher: P,
    store: S,
    targets: Vec<CrawlTarget>,
    phases: HashMap<i64, TargetPhase>,
    control: CrawlControl,
    config_hash: String,
}

impl<F, P, S> CrawlEngine<F, P, S>
where
    F: PageSource,
    P: Publisher,
    S: TargetStore,
{
    /// Creates an engine with no targets loaded
    pub fn new(settings: EngineSettings, fetcher: F, publisher: P, store: S) -> Self {
        Self {
            settings,
            fetcher,
            publisher,
            store,
            targets: Vec::new(),
            phases: HashMap::new(),
            control: CrawlControl::new(),
            config_hash: String::new(),
        }
    }

    /// Sets the configuration hash recorded with every cycle
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Handle for pausing or cancelling the engine from another task
    pub fn control(&self) -> CrawlControl {
        self.control.clone()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// (Re)loads the targets from the store
    ///
    /// Titles cached earlier in the session are kept for targets that are
    /// still tracked.
    ///
    /// # Returns
    ///
    /// The number of targets now loaded
    pub fn load_targets(&mut self) -> Result<usize> {
        let loaded = self.store.load_targets()?;

        let titles: HashMap<i64, String> = self
            .targets
            .drain(..)
            .map(|target| (target.id, target.title))
            .collect();

        self.targets = loaded
            .into_iter()
            .map(|mut target| {
                if let Some(title) = titles.get(&target.id) {
                    target.title = title.clone();
                }
                target
            })
            .collect();

        let targets = &self.targets;
        self.phases
            .retain(|id, _| targets.iter().any(|target| target.id == *id));

        tracing::debug!("Loaded {} targets", self.targets.len());
        Ok(self.targets.len())
    }

    /// Copy of the targets as the engine currently sees them
    pub fn snapshot_targets(&self) -> Vec<CrawlTarget> {
        self.targets.clone()
    }

    /// Current phase of a target
    pub fn phase_of(&self, target_id: i64) -> TargetPhase {
        self.phases.get(&target_id).copied().unwrap_or_default()
    }

    fn set_phase(&mut self, target_id: i64, next: TargetPhase) -> Result<()> {
        let current = self.phase_of(target_id);
        if current == next {
            return Ok(());
        }
        if !current.can_transition_to(next) {
            return Err(FloorwatchError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.phases.insert(target_id, next);
        Ok(())
    }

    /// Fetches and parses one page, giving up early on cancel
    async fn fetch_parsed(&self, url: &str) -> Result<ParsedPage> {
        let html = tokio::select! {
            result = self.fetcher.fetch_page(url) => result?,
            _ = self.control.cancelled() => return Err(FloorwatchError::Cancelled),
        };

        parse_page(&html).map_err(|source| FloorwatchError::Parse {
            url: url.to_string(),
            source,
        })
    }

    /// Fetches page 1 of a target's thread
    ///
    /// # Returns
    ///
    /// * `Ok(ThreadProbe)` - Title, page count and the parsed first page
    /// * `Err(FloorwatchError)` - Fetch failed, or the thread header is gone
    pub async fn probe(&self, target: &CrawlTarget) -> Result<ThreadProbe> {
        let url = self
            .fetcher
            .page_url(target.board_id, target.thread_id, 1);
        let first_page = self.fetch_parsed(&url).await?;

        tracing::debug!(
            "Probed bsn={} snA={}: '{}', {} pages",
            target.board_id,
            target.thread_id,
            first_page.title,
            first_page.total_pages
        );

        Ok(ThreadProbe {
            title: first_page.title.clone(),
            total_pages: first_page.total_pages,
            first_page_url: url,
            first_page,
        })
    }

    /// Fetches the batch window after a target's resume point
    ///
    /// Pages are fetched in order. The first fetch or parse failure ends the
    /// batch; pages fetched before it are returned.
    pub async fn fetch_window(&self, target: &CrawlTarget, probe: ThreadProbe) -> WindowFetch {
        let cursor = CrawlCursor::new(target.last_floor);
        let window = cursor.page_window(probe.total_pages, self.settings.pages_per_batch);

        let mut first_page = Some((probe.first_page_url, probe.first_page));
        let mut pages = Vec::new();

        for number in window {
            if self.control.is_cancelled() {
                return WindowFetch {
                    pages,
                    error: Some(FloorwatchError::Cancelled),
                };
            }

            let fetched = match (number, first_page.take()) {
                (1, Some((url, page))) => Ok((url, page)),
                _ => {
                    let url = self
                        .fetcher
                        .page_url(target.board_id, target.thread_id, number);
                    self.fetch_parsed(&url).await.map(|page| (url, page))
                }
            };

            let result = fetched.and_then(|(url, page)| {
                let posts = page
                    .posts
                    .iter()
                    .map(|fragment| parse_post(fragment, &url))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|source| FloorwatchError::Parse {
                        url: url.clone(),
                        source,
                    })?;
                Ok(FetchedPage { number, url, posts })
            });

            match result {
                Ok(page) => {
                    tracing::debug!(
                        "Fetched page {} of bsn={} snA={} ({} posts)",
                        number,
                        target.board_id,
                        target.thread_id,
                        page.posts.len()
                    );
                    pages.push(page);
                }
                Err(e) => {
                    tracing::warn!(
                        "Batch for bsn={} snA={} stopped at page {}: {}",
                        target.board_id,
                        target.thread_id,
                        number,
                        e
                    );
                    return WindowFetch {
                        pages,
                        error: Some(e),
                    };
                }
            }
        }

        WindowFetch { pages, error: None }
    }

    /// Runs one crawl cycle over all loaded targets
    ///
    /// # Returns
    ///
    /// * `Ok(CycleSummary)` - The cycle ran to completion, or stopped on pause
    ///   or cancel
    /// * `Err(FloorwatchError)` - Target state could not be persisted
    pub async fn run_cycle(&mut self) -> Result<CycleSummary> {
        let mut summary = CycleSummary::new();
        let cycle_id = self.store.start_cycle(&self.config_hash)?;

        tracing::info!(
            "Starting cycle {} with {} targets",
            cycle_id,
            self.targets.len()
        );

        for phase in self.phases.values_mut() {
            if *phase == TargetPhase::Failed {
                *phase = TargetPhase::Idle;
            }
        }

        let mut status = CycleStatus::Completed;
        let mut removed = Vec::new();

        for index in 0..self.targets.len() {
            if self.control.is_cancelled() {
                status = CycleStatus::Cancelled;
                break;
            }
            if self.control.is_paused() {
                tracing::info!("Paused before {}", self.targets[index]);
                status = CycleStatus::Paused;
                break;
            }

            let mut target = self.targets[index].clone();
            summary.targets_attempted += 1;
            tracing::info!(
                "Crawling {} from floor {}",
                target,
                CrawlCursor::new(target.last_floor).start_floor()
            );

            let outcome = self.crawl_target(&mut target, &mut summary).await;
            let target_id = target.id;
            let label = target.label();
            self.targets[index] = target;

            match outcome {
                Ok(TargetOutcome::Finished) => {
                    self.set_phase(target_id, TargetPhase::Idle)?;
                }
                Ok(TargetOutcome::Interrupted) => {
                    self.set_phase(target_id, TargetPhase::Idle)?;
                    status = CycleStatus::Cancelled;
                    break;
                }
                Err(e) if e.removed_target().is_some() => {
                    tracing::warn!("Target {} was removed during the cycle: {}", label, e);
                    self.phases.remove(&target_id);
                    removed.push(target_id);
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!("Storage failure while crawling {}: {}", label, e);
                    self.phases.insert(target_id, TargetPhase::Failed);
                    summary.record_failure(label, &e);
                    self.abort_cycle(cycle_id, &mut summary);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Target {} failed: {}", label, e);
                    self.set_phase(target_id, TargetPhase::Failed)?;
                    summary.record_failure(label, &e);
                }
            }
        }

        self.targets.retain(|target| !removed.contains(&target.id));
        self.store.save_targets(&self.targets)?;
        summary.finish(status);
        self.store.finish_cycle(cycle_id, &summary)?;

        tracing::info!(
            "Cycle {} {}: {} forwarded, {} skipped, {} failed targets",
            cycle_id,
            summary.status,
            summary.posts_forwarded,
            summary.posts_skipped,
            summary.failed_targets.len()
        );

        Ok(summary)
    }

    /// Best-effort bookkeeping after a storage failure
    fn abort_cycle(&mut self, cycle_id: i64, summary: &mut CycleSummary) {
        summary.finish(CycleStatus::Failed);
        if let Err(e) = self.store.finish_cycle(cycle_id, summary) {
            tracing::error!("Failed to record aborted cycle {}: {}", cycle_id, e);
        }
    }

    async fn crawl_target(
        &mut self,
        target: &mut CrawlTarget,
        summary: &mut CycleSummary,
    ) -> Result<TargetOutcome> {
        let target_id = target.id;

        self.set_phase(target_id, TargetPhase::FetchingFirstPage)?;
        let probe = match self.probe(target).await {
            Ok(probe) => probe,
            Err(FloorwatchError::Cancelled) => return Ok(TargetOutcome::Interrupted),
            Err(e) => return Err(e),
        };
        if target.title.is_empty() {
            target.title = probe.title.clone();
        }

        self.set_phase(target_id, TargetPhase::FetchingBatch)?;
        let window = self.fetch_window(target, probe).await;

        self.set_phase(target_id, TargetPhase::Draining)?;
        let outcome = self.drain(target, window.pages, summary).await?;

        match window.error {
            Some(FloorwatchError::Cancelled) => Ok(TargetOutcome::Interrupted),
            Some(e) if outcome == TargetOutcome::Finished => Err(e),
            _ => Ok(outcome),
        }
    }

    /// Publishes the accepted posts of the fetched pages in floor order
    async fn drain(
        &mut self,
        target: &mut CrawlTarget,
        pages: Vec<FetchedPage>,
        summary: &mut CycleSummary,
    ) -> Result<TargetOutcome> {
        let mut posts: Vec<PostRecord> = pages.into_iter().flat_map(|page| page.posts).collect();
        posts.sort_by_key(|post| post.floor);

        let mut vocabulary: Option<Vec<ForumTag>> = None;
        let mut accepted = 0u32;
        let mut rejected = 0u32;

        for mut post in posts {
            if self.control.is_cancelled() {
                return Ok(TargetOutcome::Interrupted);
            }

            match skip_reason(target, &post) {
                Some(SkipReason::AlreadyProcessed) => continue,
                Some(reason) => {
                    tracing::debug!(
                        "Skipping floor {} of {} ({:?}, GP {}, BP {})",
                        post.floor,
                        target.label(),
                        reason,
                        post.approval_score,
                        post.disapproval_score
                    );
                    summary.posts_skipped += 1;
                    rejected += 1;
                    continue;
                }
                None => {}
            }

            if !post.has_own_title() {
                post.title = target.title.clone();
            }

            let tags = match vocabulary.take() {
                Some(tags) => tags,
                None => self.publisher.available_tags(target.channel_id).await?,
            };
            let request = package_post(&post, &tags);
            vocabulary = Some(tags);

            let handle = self.publisher.publish(target.channel_id, request).await?;

            target.last_floor = post.floor;
            self.store.update_last_floor(target.id, post.floor)?;
            summary.posts_forwarded += 1;
            accepted += 1;
            tracing::debug!(
                "Forwarded floor {} of {} as {}",
                post.floor,
                target.label(),
                handle
            );

            if !self.control.sleep(self.settings.post_delay).await {
                return Ok(TargetOutcome::Interrupted);
            }
        }

        // Rejected floors do not move the pointer, so this window comes back
        if accepted == 0 && rejected > 0 {
            tracing::warn!(
                "No new post of {} passed its thresholds ({} rejected); it stays at floor {}",
                target.label(),
                rejected,
                target.last_floor
            );
        }

        Ok(TargetOutcome::Finished)
    }
}
