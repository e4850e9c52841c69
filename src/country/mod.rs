//! Country and flag resolution
//!
//! Phone numbers are matched against a static table of calling codes using
//! longest-prefix matching, so a four digit code such as `1242` (Bahamas)
//! wins over the one digit `1`. The flag URL is built from a template; no
//! network access is needed to resolve it. `confirm_flag` optionally probes
//! the result before it is shown.

mod table;

pub use table::{CallingCode, CALLING_CODES};

use crate::fetch::Fetcher;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Result of resolving a number to a territory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagInfo {
    /// Matched calling code, without `+`
    pub calling_code: &'static str,
    /// Lowercase ISO 3166-1 alpha-2 code
    pub iso_code: String,
    /// Templated flag image URL
    pub flag_url: String,
}

/// Returns the calling code table sorted by descending code length
fn codes_by_length() -> &'static [CallingCode] {
    static SORTED: OnceLock<Vec<CallingCode>> = OnceLock::new();
    SORTED.get_or_init(|| {
        let mut codes = CALLING_CODES.to_vec();
        codes.sort_by(|a, b| b.code.len().cmp(&a.code.len()).then(a.code.cmp(b.code)));
        codes
    })
}

/// Finds the longest calling code that prefixes the given digits
pub fn lookup_calling_code(digits: &str) -> Option<&'static CallingCode> {
    codes_by_length()
        .iter()
        .find(|entry| digits.starts_with(entry.code))
}

/// Resolves numbers to ISO codes and flag image URLs
#[derive(Debug, Clone)]
pub struct FlagResolver {
    template: String,
}

impl FlagResolver {
    /// Creates a resolver; `{iso}` in the template is replaced by the ISO code
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Builds the flag URL for an ISO code
    pub fn flag_url(&self, iso: &str) -> String {
        self.template.replace("{iso}", &iso.to_lowercase())
    }

    /// Resolves a number using the default territory for shared codes
    pub fn resolve(&self, number: &str) -> Option<FlagInfo> {
        self.resolve_with_hint(number, None)
    }

    /// Resolves a number, letting a URL hint pick among territories that share
    /// a calling code
    ///
    /// The hint is matched against the URL's path segments. This is a best
    /// effort enrichment and never authoritative.
    pub fn resolve_with_hint(&self, number: &str, hint: Option<&str>) -> Option<FlagInfo> {
        let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }

        let entry = lookup_calling_code(&digits)?;
        let iso = hint
            .and_then(|h| pick_alternate(entry, h))
            .unwrap_or(entry.iso);

        Some(FlagInfo {
            calling_code: entry.code,
            iso_code: iso.to_string(),
            flag_url: self.flag_url(iso),
        })
    }
}

fn pick_alternate(entry: &CallingCode, hint: &str) -> Option<&'static str> {
    if entry.alternates.is_empty() {
        return None;
    }

    let segments = hint_segments(hint);
    entry
        .alternates
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|keyword| {
                segments.iter().any(|segment| {
                    segment == keyword || (keyword.len() > 3 && segment.contains(keyword))
                })
            })
        })
        .map(|(iso, _)| *iso)
}

fn hint_segments(hint: &str) -> Vec<String> {
    let path = match Url::parse(hint) {
        Ok(url) => url.path().to_string(),
        Err(_) => hint.to_string(),
    };

    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Picks the flag to show with a notification
///
/// When probing is enabled, the resolved flag is only used if it answers a
/// HEAD request; otherwise the first available fallback is returned. A failed
/// probe never discards the resolution itself.
pub async fn confirm_flag(
    fetcher: &Fetcher,
    resolved: Option<&str>,
    fallbacks: &[Option<&str>],
    probe: Option<Duration>,
) -> Option<String> {
    let fallback = fallbacks.iter().flatten().next().map(|s| s.to_string());

    let Some(candidate) = resolved else {
        return fallback;
    };

    match probe {
        None => Some(candidate.to_string()),
        Some(timeout) => {
            if fetcher.is_reachable(candidate, timeout).await {
                Some(candidate.to_string())
            } else {
                tracing::debug!(flag = candidate, "flag probe failed, using fallback");
                fallback.or_else(|| Some(candidate.to_string()))
            }
        }
    }
}
