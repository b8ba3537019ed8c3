//! Configuration module for Floorwatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use floorwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("floorwatch.toml")).unwrap();
//! println!("Database: {}", config.storage.database_path);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, ForumConfig, OutputConfig, StorageConfig, TargetEntry,
    DEFAULT_USER_AGENT,
};

pub use parser::{hash_config_text, load_config, load_config_with_hash, parse_config};
