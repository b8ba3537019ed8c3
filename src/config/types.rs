use crate::state::CrawlTarget;
use serde::Deserialize;

/// Browser-like user agent; the forum serves stripped pages to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/84.0.4147.105 Safari/537.36";

/// Main configuration structure for Floorwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub forum: ForumConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
    /// Seed targets, upserted into the target store when the config is loaded
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetEntry>,
}

/// Forum access configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForumConfig {
    /// Scheme and host of the forum, e.g. `https://forum.gamer.com.tw`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Minimum time between two page requests (milliseconds)
    #[serde(default = "default_min_request_interval")]
    pub min_request_interval: u64,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            min_request_interval: default_min_request_interval(),
        }
    }
}

/// Crawl cycle behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of consecutive pages fetched per target per cycle
    #[serde(default = "default_pages_per_batch")]
    pub pages_per_batch: u32,

    /// Delay after every forwarded post (milliseconds)
    #[serde(default = "default_post_delay")]
    pub post_delay: u64,

    /// Pause between two cycles in `run` mode (seconds)
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            pages_per_batch: default_pages_per_batch(),
            post_delay: default_post_delay(),
            cycle_interval: default_cycle_interval(),
        }
    }
}

/// Persistent state location
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database holding targets and cycle history
    pub database_path: String,
}

/// Publisher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the archive publisher writes threads into
    pub archive_dir: String,

    /// Tag vocabulary offered to posts, in priority order
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One tracked thread as written in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetEntry {
    pub channel_id: u64,
    pub board_id: u64,
    pub thread_id: u64,
    #[serde(default)]
    pub last_floor: u32,
    #[serde(default)]
    pub gp_threshold: u32,
    #[serde(default)]
    pub bp_threshold: u32,
}

impl TargetEntry {
    /// Converts the entry into a target that has not been stored yet
    pub fn to_target(&self) -> CrawlTarget {
        CrawlTarget::new(self.channel_id, self.board_id, self.thread_id)
            .with_last_floor(self.last_floor)
            .with_thresholds(self.gp_threshold, self.bp_threshold)
    }
}

fn default_base_url() -> String {
    crate::url::DEFAULT_FORUM_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_min_request_interval() -> u64 {
    1000
}

fn default_pages_per_batch() -> u32 {
    2
}

fn default_post_delay() -> u64 {
    5000
}

fn default_cycle_interval() -> u64 {
    20 * 60
}
