//! HTTP fetching for numwatch
//!
//! This module contains:
//! - The `Fetcher`, which performs GET requests with fixed headers, a single
//!   overall timeout and bounded retries, and never surfaces an error
//! - The `with_retry` helper shared by the fetcher and API strategies

mod client;
mod retry;

pub use client::{build_http_client, Fetcher};
pub use retry::{with_retry, RetryPolicy};
