//! Keyed HTTP API strategy
//!
//! The API lists country buckets, then the free numbers of each bucket:
//!
//! ```text
//! GET {base}/getFreeList?lang=en&apikey=KEY            -> {"countries": [{"country": 44, "country_text": "UK"}]}
//! GET {base}/getFreeList?lang=en&apikey=KEY&country=44 -> {"numbers": {"447700": {"full_number": "+447700", "is_archive": false}}}
//! ```
//!
//! Numbers keep the order the API lists them in, newest first. Entries
//! without `is_archive` are treated as archived.

use crate::config::ApiConfig;
use crate::fetch::Fetcher;
use crate::parser::strategy::{ExtractError, Extractor, Page};
use crate::state::Strategy;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

#[derive(Debug, Deserialize)]
struct CountryList {
    #[serde(default)]
    countries: Vec<CountryBucket>,
}

#[derive(Debug, Deserialize)]
struct CountryBucket {
    country: Value,
    #[serde(default)]
    country_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NumberList {
    #[serde(default)]
    numbers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct NumberDetails {
    #[serde(default)]
    full_number: Option<String>,
    #[serde(default)]
    is_archive: Option<bool>,
}

pub struct KeyedApiExtractor {
    fetcher: Fetcher,
    api: ApiConfig,
}

impl KeyedApiExtractor {
    pub fn new(fetcher: Fetcher, api: ApiConfig) -> Self {
        Self { fetcher, api }
    }

    fn list_url(&self, country: Option<&str>) -> Result<String, ExtractError> {
        let base = format!("{}/getFreeList", self.api.base_url.trim_end_matches('/'));
        let mut params = vec![("lang", "en"), ("apikey", self.api.key.as_str())];
        if let Some(country) = country {
            params.push(("country", country));
        }
        Ok(Url::parse_with_params(&base, &params)?.to_string())
    }

    async fn country_numbers(&self, country: &str) -> Result<Vec<String>, ExtractError> {
        let body = self.fetcher.fetch_strict(&self.list_url(Some(country))?).await?;
        let list: NumberList = serde_json::from_str(&body)?;

        let mut values = Vec::with_capacity(list.numbers.len());
        for (id, details) in list.numbers {
            let details: NumberDetails = match serde_json::from_value(details) {
                Ok(details) => details,
                Err(e) => {
                    tracing::debug!(%country, %id, error = %e, "skipping malformed entry");
                    continue;
                }
            };
            if details.is_archive == Some(false) {
                values.push(details.full_number.unwrap_or_else(|| format!("+{}", id)));
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl Extractor for KeyedApiExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::KeyedApi
    }

    async fn try_extract(&self, _page: &Page<'_>) -> Result<Vec<String>, ExtractError> {
        let body = self.fetcher.fetch_strict(&self.list_url(None)?).await?;
        let list: CountryList = serde_json::from_str(&body)?;

        let mut values = Vec::new();
        for bucket in list.countries {
            let country = match &bucket.country {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };

            match self.country_numbers(&country).await {
                Ok(numbers) => values.extend(numbers),
                Err(e) => {
                    tracing::debug!(
                        %country,
                        name = bucket.country_text.as_deref().unwrap_or(""),
                        error = %e,
                        "country bucket failed"
                    );
                }
            }
        }

        if values.is_empty() {
            Err(ExtractError::NoMatch)
        } else {
            Ok(values)
        }
    }
}
