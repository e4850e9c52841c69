//! Configuration module for numwatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use numwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("numwatch.toml")).unwrap();
//! println!("Watching {} sources", config.source.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, FetchConfig, FlagConfig, MonitorConfig, NotifyConfig, ParserConfig,
    RepeatConfig, RewriteRule, SelectionConfig, SourceConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
