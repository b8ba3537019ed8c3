use crate::config::types::{
    Config, CrawlerConfig, ForumConfig, OutputConfig, StorageConfig, TargetEntry,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_forum_config(&config.forum)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.targets)?;
    Ok(())
}

fn validate_forum_config(config: &ForumConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout == 0 || config.request_timeout > 300 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be between 1 and 300 seconds, got {}",
            config.request_timeout
        )));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.pages_per_batch < 1 || config.pages_per_batch > 20 {
        return Err(ConfigError::Validation(format!(
            "pages-per-batch must be between 1 and 20, got {}",
            config.pages_per_batch
        )));
    }

    if config.cycle_interval < 60 {
        return Err(ConfigError::Validation(format!(
            "cycle-interval must be >= 60 seconds, got {}",
            config.cycle_interval
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.archive_dir.is_empty() {
        return Err(ConfigError::Validation(
            "archive-dir cannot be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for tag in &config.tags {
        if tag.trim().is_empty() {
            return Err(ConfigError::Validation("tag names cannot be empty".to_string()));
        }
        if !seen.insert(tag.as_str()) {
            return Err(ConfigError::Validation(format!(
                "tag '{}' is listed more than once",
                tag
            )));
        }
    }

    Ok(())
}

fn validate_targets(targets: &[TargetEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for target in targets {
        if target.board_id == 0 || target.thread_id == 0 {
            return Err(ConfigError::Validation(format!(
                "target bsn={} snA={} must have non-zero board and thread ids",
                target.board_id, target.thread_id
            )));
        }

        if !seen.insert((target.channel_id, target.board_id, target.thread_id)) {
            return Err(ConfigError::Validation(format!(
                "target bsn={} snA={} is listed twice for channel {}",
                target.board_id, target.thread_id, target.channel_id
            )));
        }
    }
    Ok(())
}
