//! numwatch: change detection for pages that publish numbers
//!
//! This crate polls configured web pages, extracts the numbers they publish
//! using a cascade of extraction strategies, decides what changed since the
//! last observation and hands the result to a notification sender, optionally
//! followed by a self-renewing countdown on the sent message.

pub mod config;
pub mod country;
pub mod fetch;
pub mod monitor;
pub mod notify;
pub mod parser;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for numwatch operations
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for numwatch operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use monitor::{select_new_entries, AnchorPolicy, Monitor, Registry, SourceMonitor};
pub use notify::{LogNotifier, Notification, Notifier};
pub use state::{Observation, Source, SourceKind, Strategy, StrategyCache};
