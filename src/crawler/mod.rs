//! Crawler module for incremental thread crawling
//!
//! This module contains the core crawling logic, including:
//! - Paced HTTP fetching of thread pages
//! - Page and post parsing with body normalization
//! - Floor and page arithmetic
//! - The crawl engine and its operator controls

mod control;
mod cursor;
mod engine;
mod fetcher;
mod normalize;
mod page;
mod post;

pub use control::CrawlControl;
pub use cursor::{CrawlCursor, POSTS_PER_PAGE};
pub use engine::{
    skip_reason, CrawlEngine, EngineSettings, FetchedPage, SkipReason, ThreadProbe, WindowFetch,
};
pub use fetcher::{build_http_client, HttpFetcher, PageSource};
pub use normalize::{extract_hashtags, normalize_body_html};
pub use page::{parse_page, ParsedPage, RawPostFragment};
pub use post::{parse_post, Author, PostRecord, NO_TITLE, SATURATED_SCORE};

use crate::config::Config;
use crate::output::DirectoryPublisher;
use crate::storage::{open_store, SqliteStore};
use crate::FloorwatchError;

/// Engine wired to the live forum, the archive directory and the SQLite store
pub type DefaultEngine = CrawlEngine<HttpFetcher, DirectoryPublisher, SqliteStore>;

/// Builds the engine described by a configuration
///
/// Opens the store (upserting the configured seed targets), builds the HTTP
/// fetcher and the archive publisher, and loads the stored targets.
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `config_hash` - Hash recorded with every cycle
///
/// # Returns
///
/// * `Ok(DefaultEngine)` - Engine with targets loaded
/// * `Err(FloorwatchError)` - Store or client setup failed
pub fn build_engine(config: &Config, config_hash: &str) -> Result<DefaultEngine, FloorwatchError> {
    let store = open_store(config)?;
    let fetcher = HttpFetcher::new(&config.forum)?;
    let publisher = DirectoryPublisher::new(&config.output.archive_dir, &config.output.tags);
    tracing::info!("Archiving posts under {}", publisher.root().display());

    let mut engine = CrawlEngine::new(
        EngineSettings::from_config(&config.crawler),
        fetcher,
        publisher,
        store,
    )
    .with_config_hash(config_hash);

    let count = engine.load_targets()?;
    tracing::info!("Loaded {} targets", count);

    Ok(engine)
}
