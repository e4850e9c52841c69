use crate::config::{RewriteRule, SourceConfig};
use crate::url::apply_rewrites;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Declared or inferred shape of a source's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The page shows one current value
    Single,
    /// The page lists values, newest first
    Multiple,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Single => "single",
            SourceKind::Multiple => "multiple",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful parse of a source, tagged by shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Single { value: String },
    Multiple { values: Vec<String> },
}

impl Observation {
    /// Builds an observation from raw extracted strings
    ///
    /// Values are normalized and empty ones dropped. With a declared kind the
    /// result takes that shape, so a one-element list under `Multiple` stays a
    /// list. Without one, a single value is `Single` and more are `Multiple`.
    ///
    /// # Returns
    ///
    /// * `None` - if nothing usable remains after normalization
    pub fn from_values<I, S>(raw: I, declared: Option<SourceKind>) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values: Vec<String> = raw
            .into_iter()
            .filter_map(|v| normalize_value(v.as_ref()))
            .collect();

        if values.is_empty() {
            return None;
        }

        let kind = declared.unwrap_or(if values.len() == 1 {
            SourceKind::Single
        } else {
            SourceKind::Multiple
        });

        Some(match kind {
            SourceKind::Single => Observation::Single {
                value: values.swap_remove(0),
            },
            SourceKind::Multiple => Observation::Multiple { values },
        })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Observation::Single { .. } => SourceKind::Single,
            Observation::Multiple { .. } => SourceKind::Multiple,
        }
    }

    /// The head value: the sole value, or the first (newest) list entry
    pub fn head(&self) -> &str {
        match self {
            Observation::Single { value } => value,
            Observation::Multiple { values } => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Reshapes the observation to `kind`
    ///
    /// A single value becomes a one-element list; a list keeps only its head.
    pub fn into_kind(self, kind: SourceKind) -> Self {
        match (self, kind) {
            (Observation::Single { value }, SourceKind::Multiple) => Observation::Multiple {
                values: vec![value],
            },
            (Observation::Multiple { mut values }, SourceKind::Single) if !values.is_empty() => {
                Observation::Single {
                    value: values.swap_remove(0),
                }
            }
            (observation, _) => observation,
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Observation::Single { value } => std::slice::from_ref(value),
            Observation::Multiple { values } => values,
        }
    }
}

/// Normalizes a scraped value for comparison
///
/// Surrounding whitespace, a leading `+` and inner whitespace are removed.
pub fn normalize_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let value: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// One monitored page and its last known state
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: String,

    /// Effective URL, after host-prefix rewrites
    pub url: String,

    /// Declared kind from configuration
    pub kind: Option<SourceKind>,

    /// Kind inferred from the first successful parse when none is declared
    pub observed_kind: Option<SourceKind>,

    /// Disabled sources are skipped by the loop but stay registered
    pub enabled: bool,

    /// Per-source polling interval override
    pub check_interval: Option<Duration>,

    pub last_value: Option<String>,

    /// Head value before the last confirmed change; the selection anchor
    pub previous_last_value: Option<String>,

    /// Snapshot of the last successful multi-value parse, newest first
    pub latest_values: Vec<String>,

    pub is_initial_run: bool,

    pub flag_url: Option<String>,
}

impl Source {
    /// Creates a source from configuration with no observed state
    pub fn from_config(config: &SourceConfig, rewrites: &[RewriteRule]) -> Self {
        Self {
            id: config.id.clone(),
            url: apply_rewrites(&config.url, rewrites),
            kind: config.kind,
            observed_kind: None,
            enabled: config.enabled,
            check_interval: config.check_interval.map(Duration::from_secs),
            last_value: None,
            previous_last_value: None,
            latest_values: Vec::new(),
            is_initial_run: false,
            flag_url: None,
        }
    }

    /// Declared kind, falling back to the observed one
    pub fn effective_kind(&self) -> Option<SourceKind> {
        self.kind.or(self.observed_kind)
    }
}
