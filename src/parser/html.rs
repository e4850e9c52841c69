//! HTML selector strategies
//!
//! Extracts number text from a page with CSS selectors, and picks up the
//! page's own flag image for use as a fallback:
//! - Single pages: the first matching element with non-empty text
//! - Multiple pages: every matching element with non-empty text, in
//!   document order
//! - Flag image: the first `<img>` whose `alt` mentions "flag"

use crate::parser::strategy::{ExtractError, Extractor, Page};
use crate::state::{SourceKind, Strategy};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts values with one CSS selector
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    selector: String,
    kind: SourceKind,
}

impl HtmlExtractor {
    pub fn new(selector: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            selector: selector.into(),
            kind,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

#[async_trait]
impl Extractor for HtmlExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Html {
            selector: self.selector.clone(),
            kind: self.kind,
        }
    }

    async fn try_extract(&self, page: &Page<'_>) -> Result<Vec<String>, ExtractError> {
        select_values(page.body, &self.selector, self.kind)
    }
}

/// Runs a selector against an HTML document
///
/// # Arguments
///
/// * `html` - The page body
/// * `selector` - CSS selector to match
/// * `kind` - `Single` stops at the first non-empty match
///
/// # Returns
///
/// * `Ok(values)` - trimmed, non-empty element texts
/// * `Err(ExtractError::NoMatch)` - nothing matched with text
pub fn select_values(html: &str, selector: &str, kind: SourceKind) -> Result<Vec<String>, ExtractError> {
    let selector =
        Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);

    let mut texts = document.select(&selector).filter_map(element_text);
    let values: Vec<String> = match kind {
        SourceKind::Single => texts.next().into_iter().collect(),
        SourceKind::Multiple => texts.collect(),
    };

    if values.is_empty() {
        Err(ExtractError::NoMatch)
    } else {
        Ok(values)
    }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Finds the page's own flag image
///
/// `data-lazy-src` is preferred over `src`; the result is resolved against
/// the page URL.
pub fn page_flag_image(html: &str, page_url: &str) -> Option<String> {
    let selector = Selector::parse("img[alt]").ok()?;
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    document
        .select(&selector)
        .filter(|img| {
            img.value()
                .attr("alt")
                .map(|alt| alt.to_lowercase().contains("flag"))
                .unwrap_or(false)
        })
        .find_map(|img| {
            let src = img
                .value()
                .attr("data-lazy-src")
                .or_else(|| img.value().attr("src"))?
                .trim();
            if src.is_empty() || src.starts_with("data:") {
                return None;
            }
            match &base {
                Some(base) => base.join(src).ok().map(|u| u.to_string()),
                None => Some(src.to_string()),
            }
        })
}
