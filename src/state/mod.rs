//! Source records and extraction strategy memory
//!
//! # Components
//!
//! - `Source`: one monitored page with its last observed values
//! - `Observation`: a successful parse, tagged `Single` or `Multiple`
//! - `StrategyCache`: per-domain cache of the last working `Strategy`

mod source;
mod strategy_cache;

pub use source::{normalize_value, Observation, Source, SourceKind};
pub use strategy_cache::{Strategy, StrategyCache};
