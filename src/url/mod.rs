//! URL helpers for numwatch
//!
//! This module derives the per-domain key used by the strategy cache and
//! applies configured host-prefix rewrites to source URLs.

mod domain;
mod rewrite;

// Re-export main functions
pub use domain::{domain_key, extract_domain};
pub use rewrite::apply_rewrites;
