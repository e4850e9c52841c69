//! Extraction strategy seam
//!
//! Each `Extractor` implements one `Strategy`. The content parser iterates an
//! ordered list of them; errors stay local to a strategy and only mean "try
//! the next one".

use crate::state::{SourceKind, Strategy};
use async_trait::async_trait;
use thiserror::Error;

/// Why one strategy produced nothing
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no values found")]
    NoMatch,

    #[error("invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A fetched page handed to each strategy
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub url: &'a str,
    pub body: &'a str,
    /// Declared kind of the source, if known
    pub kind: Option<SourceKind>,
}

/// One method of extracting values from a source
#[async_trait]
pub trait Extractor: Send + Sync {
    /// The strategy this extractor implements, as stored in the cache
    fn strategy(&self) -> Strategy;

    /// Tries to extract raw values from the page
    ///
    /// # Returns
    ///
    /// * `Ok(values)` - at least one raw value, newest first
    /// * `Err(ExtractError)` - this strategy found nothing usable
    async fn try_extract(&self, page: &Page<'_>) -> Result<Vec<String>, ExtractError>;
}
