//! Content parser: fetches a source page and runs the strategy cascade
//!
//! Strategies are tried in a fixed priority order:
//! 1. Single-value CSS selectors
//! 2. Multi-value CSS selectors
//! 3. The JSON endpoint derived from the page origin
//! 4. The keyed API, when configured
//!
//! A strategy cached for the page's domain is tried first and on its own.
//! If it fails, the failure is counted against the cache and the rest of the
//! cascade runs. The first strategy that yields values wins and is cached.
//!
//! When the page itself cannot be fetched, only the API strategies run, and
//! an overall miss is not counted against the cache.

mod html;
mod json;
mod keyed;
mod strategy;

pub use html::{page_flag_image, select_values, HtmlExtractor};
pub use json::{values_from_json, JsonExtractor};
pub use keyed::KeyedApiExtractor;
pub use strategy::{ExtractError, Extractor, Page};

use crate::config::{ApiConfig, ParserConfig};
use crate::country::{FlagInfo, FlagResolver};
use crate::fetch::Fetcher;
use crate::state::{Observation, SourceKind, Strategy, StrategyCache};
use std::sync::{Arc, Mutex, MutexGuard};

/// Result of a successful parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub observation: Observation,
    /// Flag resolved from the head value
    pub flag: Option<FlagInfo>,
    /// Flag image found on the page itself
    pub page_image: Option<String>,
    /// Strategy that produced the values
    pub strategy: Strategy,
}

impl ParseOutcome {
    pub fn flag_url(&self) -> Option<&str> {
        self.flag.as_ref().map(|f| f.flag_url.as_str())
    }
}

/// Runs the extraction cascade against source pages
pub struct ContentParser {
    fetcher: Fetcher,
    resolver: FlagResolver,
    cascade: Vec<Arc<dyn Extractor>>,
    cache: Mutex<StrategyCache>,
}

impl ContentParser {
    /// Builds the cascade from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - selector lists, JSON suffix and cache threshold
    /// * `api` - enables the keyed API strategy when present
    /// * `fetcher` - shared HTTP fetcher
    /// * `resolver` - flag resolver for the head value
    pub fn new(
        config: &ParserConfig,
        api: Option<&ApiConfig>,
        fetcher: Fetcher,
        resolver: FlagResolver,
    ) -> Self {
        let mut cascade: Vec<Arc<dyn Extractor>> = Vec::new();
        for selector in &config.single_selectors {
            cascade.push(Arc::new(HtmlExtractor::new(selector.clone(), SourceKind::Single)));
        }
        for selector in &config.multiple_selectors {
            cascade.push(Arc::new(HtmlExtractor::new(selector.clone(), SourceKind::Multiple)));
        }
        cascade.push(Arc::new(JsonExtractor::new(
            fetcher.clone(),
            config.json_suffix.clone(),
        )));
        if let Some(api) = api {
            cascade.push(Arc::new(KeyedApiExtractor::new(fetcher.clone(), api.clone())));
        }

        Self {
            fetcher,
            resolver,
            cascade,
            cache: Mutex::new(StrategyCache::new(config.failure_threshold)),
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Returns a snapshot of the cached strategy for a URL's domain
    pub fn cached_strategy(&self, url: &str) -> Option<Strategy> {
        self.cache().get(url)
    }

    fn cache(&self) -> MutexGuard<'_, StrategyCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetches and parses a source page
    ///
    /// # Returns
    ///
    /// * `Some(ParseOutcome)` - the first strategy that produced values
    /// * `None` - every strategy that could run failed
    pub async fn parse(&self, url: &str, kind: Option<SourceKind>) -> Option<ParseOutcome> {
        let body = self.fetcher.fetch(url).await;
        let page = Page {
            url,
            body: &body,
            kind,
        };

        if body.is_empty() {
            tracing::debug!(%url, "no page content, trying API strategies only");
            return self.run(&page, false).await;
        }
        self.run(&page, true).await
    }

    /// Runs the cascade on an already fetched page body
    pub async fn parse_body(
        &self,
        url: &str,
        body: &str,
        kind: Option<SourceKind>,
    ) -> Option<ParseOutcome> {
        self.run(&Page { url, body, kind }, true).await
    }

    async fn run(&self, page: &Page<'_>, have_page: bool) -> Option<ParseOutcome> {
        let url = page.url;
        let cached = self.cached_strategy(url);
        let mut failure_counted = false;

        if let Some(strategy) = &cached {
            let failed = match self.extractor_for(strategy) {
                Some(extractor) if !usable(extractor.as_ref(), page.kind, have_page) => false,
                Some(extractor) => match self.attempt(extractor.as_ref(), page).await {
                    Some(outcome) => {
                        self.cache().record(url, outcome.strategy.clone());
                        return Some(outcome);
                    }
                    None => true,
                },
                None => true,
            };
            if failed {
                tracing::debug!(%url, %strategy, "cached strategy failed");
                self.cache().fail(url);
                failure_counted = true;
            }
        }

        for extractor in self
            .cascade
            .iter()
            .filter(|e| usable(e.as_ref(), page.kind, have_page))
        {
            if cached.as_ref() == Some(&extractor.strategy()) {
                continue;
            }
            if let Some(outcome) = self.attempt(extractor.as_ref(), page).await {
                self.cache().record(url, outcome.strategy.clone());
                return Some(outcome);
            }
        }

        tracing::debug!(%url, "all strategies failed");
        if have_page && !failure_counted {
            self.cache().fail(url);
        }
        None
    }

    fn extractor_for(&self, strategy: &Strategy) -> Option<Arc<dyn Extractor>> {
        if let Some(found) = self.cascade.iter().find(|e| &e.strategy() == strategy) {
            return Some(Arc::clone(found));
        }

        match strategy {
            Strategy::Html { selector, kind } => {
                Some(Arc::new(HtmlExtractor::new(selector.clone(), *kind)))
            }
            _ => None,
        }
    }

    async fn attempt(&self, extractor: &dyn Extractor, page: &Page<'_>) -> Option<ParseOutcome> {
        let strategy = extractor.strategy();
        let raw = match extractor.try_extract(page).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(url = page.url, %strategy, error = %e, "strategy failed");
                return None;
            }
        };

        let Some(observation) = Observation::from_values(raw, page.kind) else {
            tracing::debug!(url = page.url, %strategy, "strategy yielded only empty values");
            return None;
        };

        let flag = self
            .resolver
            .resolve_with_hint(observation.head(), Some(page.url));
        let page_image = page_flag_image(page.body, page.url);

        tracing::debug!(
            url = page.url,
            %strategy,
            count = observation.values().len(),
            "strategy succeeded"
        );

        Some(ParseOutcome {
            observation,
            flag,
            page_image,
            strategy,
        })
    }
}

/// HTML strategies need a page body and only run for pages of their own
/// shape, once the shape is known
fn usable(extractor: &dyn Extractor, kind: Option<SourceKind>, have_page: bool) -> bool {
    match (extractor.strategy(), kind) {
        (Strategy::Html { .. }, _) if !have_page => false,
        (Strategy::Html { kind: selector_kind, .. }, Some(known)) => selector_kind == known,
        _ => true,
    }
}
