use crate::state::SourceKind;
use crate::url::domain_key;
use std::collections::HashMap;
use std::fmt;

/// One way of extracting values from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// A CSS selector, remembered together with the page shape it matched
    Html { selector: String, kind: SourceKind },
    /// The JSON endpoint derived from the page origin
    JsonApi,
    /// The keyed HTTP API
    KeyedApi,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Html { .. } => "html",
            Strategy::JsonApi => "json",
            Strategy::KeyedApi => "keyed-api",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Html { selector, kind } => write!(f, "html[{}]({})", selector, kind),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    strategy: Strategy,
    failure_count: u32,
}

/// Per-domain memory of the last strategy that worked
///
/// Entries are created on the first success and evicted once the cached
/// strategy has failed `threshold` times in a row. Any success resets the
/// count.
#[derive(Debug, Clone)]
pub struct StrategyCache {
    entries: HashMap<String, CacheEntry>,
    threshold: u32,
}

impl StrategyCache {
    pub fn new(threshold: u32) -> Self {
        Self {
            entries: HashMap::new(),
            threshold: threshold.max(1),
        }
    }

    /// Returns the cached strategy for the URL's domain
    pub fn get(&self, url: &str) -> Option<Strategy> {
        self.entries
            .get(&domain_key(url))
            .map(|entry| entry.strategy.clone())
    }

    /// Remembers a successful strategy and resets the failure count
    pub fn record(&mut self, url: &str, strategy: Strategy) {
        let domain = domain_key(url);
        tracing::debug!(%domain, %strategy, "caching strategy");
        self.entries.insert(
            domain,
            CacheEntry {
                strategy,
                failure_count: 0,
            },
        );
    }

    /// Counts a failure against the domain's cached strategy
    ///
    /// # Returns
    ///
    /// * `true` - if this failure evicted the entry
    /// * `false` - if the entry survives or there was none
    pub fn fail(&mut self, url: &str) -> bool {
        let domain = domain_key(url);
        let Some(entry) = self.entries.get_mut(&domain) else {
            return false;
        };

        entry.failure_count += 1;
        if entry.failure_count >= self.threshold {
            tracing::info!(
                %domain,
                strategy = %entry.strategy,
                failures = entry.failure_count,
                "evicting cached strategy"
            );
            self.entries.remove(&domain);
            true
        } else {
            false
        }
    }

    pub fn failure_count(&self, url: &str) -> Option<u32> {
        self.entries
            .get(&domain_key(url))
            .map(|entry| entry.failure_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StrategyCache {
    fn default() -> Self {
        Self::new(3)
    }
}
