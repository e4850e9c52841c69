use serde::Deserialize;
use std::time::Duration;

use crate::monitor::AnchorPolicy;
use crate::state::SourceKind;

/// Main configuration structure for numwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub flags: FlagConfig,
    #[serde(default)]
    pub repeat: RepeatConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: Option<ApiConfig>,
    #[serde(default)]
    pub rewrite: Vec<RewriteRule>,
    #[serde(default)]
    pub source: Vec<SourceConfig>,
}

/// Polling loop behavior
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between polling cycles
    #[serde(rename = "check-interval", default = "default_check_interval")]
    pub check_interval: u64,

    /// Pause between consecutive sources within a cycle (milliseconds)
    #[serde(rename = "source-pause", default = "default_source_pause")]
    pub source_pause: u64,
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn source_pause(&self) -> Duration {
        Duration::from_millis(self.source_pause)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            source_pause: default_source_pause(),
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Overall request timeout covering connect and read (milliseconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Total attempts per request, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

/// Extraction strategy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// Candidate selectors for pages showing one number, in priority order
    #[serde(rename = "single-selectors", default = "default_single_selectors")]
    pub single_selectors: Vec<String>,

    /// Candidate selectors for pages listing many numbers, in priority order
    #[serde(rename = "multiple-selectors", default = "default_multiple_selectors")]
    pub multiple_selectors: Vec<String>,

    /// Path appended to the page origin to reach the JSON endpoint
    #[serde(rename = "json-suffix", default = "default_json_suffix")]
    pub json_suffix: String,

    /// Consecutive failures after which a cached strategy is evicted
    #[serde(rename = "failure-threshold", default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            single_selectors: default_single_selectors(),
            multiple_selectors: default_multiple_selectors(),
            json_suffix: default_json_suffix(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

/// Flag image resolution
#[derive(Debug, Clone, Deserialize)]
pub struct FlagConfig {
    /// URL template; `{iso}` is replaced by the lowercase ISO code
    #[serde(default = "default_flag_template")]
    pub template: String,

    /// Whether to check the resolved flag URL before notifying
    #[serde(default = "default_true")]
    pub probe: bool,

    #[serde(rename = "probe-timeout", default = "default_probe_timeout")]
    pub probe_timeout: u64,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            template: default_flag_template(),
            probe: true,
            probe_timeout: default_probe_timeout(),
        }
    }
}

/// Repeating countdown on the latest notification
#[derive(Debug, Clone, Deserialize)]
pub struct RepeatConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Countdown length (seconds)
    #[serde(default = "default_repeat_interval")]
    pub interval: u64,

    /// Time between caption edits (milliseconds)
    #[serde(default = "default_tick")]
    pub tick: u64,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_repeat_interval(),
            tick: default_tick(),
        }
    }
}

/// Notification dispatch options
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Send one notification per new entry instead of one grouped notification
    #[serde(rename = "single-mode", default)]
    pub single_mode: bool,

    #[serde(rename = "single-mode-pause", default = "default_single_mode_pause")]
    pub single_mode_pause: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            single_mode: false,
            single_mode_pause: default_single_mode_pause(),
        }
    }
}

/// New-entry selection options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionConfig {
    #[serde(rename = "anchor-missing", default)]
    pub anchor_missing: AnchorPolicy,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Keyed HTTP API used as the last extraction strategy
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    pub key: String,
}

/// Host-prefix substitution applied to source URLs before use
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}

/// One monitored page
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,

    pub url: String,

    /// Declared kind; inferred from the first successful parse when absent
    #[serde(default)]
    pub kind: Option<SourceKind>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-source polling interval override (seconds)
    #[serde(rename = "check-interval", default)]
    pub check_interval: Option<u64>,
}

fn default_check_interval() -> u64 {
    5
}

fn default_source_pause() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    15_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_single_selectors() -> Vec<String> {
    vec![
        ".latest-added__title a".to_string(),
        ".latest-number a".to_string(),
        ".number-title".to_string(),
    ]
}

fn default_multiple_selectors() -> Vec<String> {
    vec![
        ".numbutton".to_string(),
        ".number-list li a".to_string(),
        "ul.numbers li".to_string(),
    ]
}

fn default_json_suffix() -> String {
    "/api/numbers".to_string()
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_flag_template() -> String {
    "https://flagcdn.com/w320/{iso}.png".to_string()
}

fn default_probe_timeout() -> u64 {
    5_000
}

fn default_repeat_interval() -> u64 {
    900
}

fn default_tick() -> u64 {
    1000
}

fn default_single_mode_pause() -> u64 {
    1000
}

fn default_database_path() -> String {
    "./numwatch.db".to_string()
}

fn default_true() -> bool {
    true
}
