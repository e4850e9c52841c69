//! JSON endpoint strategy
//!
//! Requests `{origin}{suffix}?_={unix_millis}` and reads values from either a
//! top-level array or an object holding a `numbers` array.

use crate::fetch::Fetcher;
use crate::parser::strategy::{ExtractError, Extractor, Page};
use crate::state::Strategy;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use url::Url;

/// Keys checked, in order, on object entries
const VALUE_KEYS: [&str; 3] = ["number", "full_number", "phone"];

pub struct JsonExtractor {
    fetcher: Fetcher,
    suffix: String,
}

impl JsonExtractor {
    pub fn new(fetcher: Fetcher, suffix: impl Into<String>) -> Self {
        Self {
            fetcher,
            suffix: suffix.into(),
        }
    }

    /// Builds the endpoint URL for a page, with a cache-busting parameter
    pub fn endpoint(&self, page_url: &str) -> Result<String, ExtractError> {
        let page = Url::parse(page_url)?;
        let mut endpoint = Url::parse(&format!(
            "{}{}",
            page.origin().ascii_serialization(),
            self.suffix
        ))?;
        endpoint
            .query_pairs_mut()
            .append_pair("_", &Utc::now().timestamp_millis().to_string());
        Ok(endpoint.to_string())
    }
}

#[async_trait]
impl Extractor for JsonExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::JsonApi
    }

    async fn try_extract(&self, page: &Page<'_>) -> Result<Vec<String>, ExtractError> {
        let endpoint = self.endpoint(page.url)?;
        let body = self.fetcher.fetch_strict(&endpoint).await?;
        let json: Value = serde_json::from_str(&body)?;

        let values = values_from_json(&json);
        if values.is_empty() {
            Err(ExtractError::NoMatch)
        } else {
            Ok(values)
        }
    }
}

/// Collects values from a JSON document, skipping archived entries
pub fn values_from_json(json: &Value) -> Vec<String> {
    let items: &[Value] = match json {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("numbers") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items.iter().filter_map(entry_value).collect()
}

fn entry_value(entry: &Value) -> Option<String> {
    match entry {
        Value::Object(map) => {
            if map.get("is_archive").and_then(Value::as_bool) == Some(true) {
                return None;
            }
            VALUE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(scalar_text))
        }
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        let config = FetchConfig {
            timeout: 2_000,
            max_attempts: 1,
            retry_delay: 1,
            ..FetchConfig::default()
        };
        Fetcher::new(&config).unwrap()
    }

    #[test]
    fn test_values_from_array() {
        let json = json!(["111", 222, {"number": "333"}, null]);
        assert_eq!(values_from_json(&json), vec!["111", "222", "333"]);
    }

    #[test]
    fn test_values_from_numbers_object() {
        let json = json!({"numbers": [
            {"full_number": "+44 1"},
            {"phone": 4402},
            {"number": "4403", "is_archive": true},
            {"number": "4404", "is_archive": false}
        ]});
        assert_eq!(values_from_json(&json), vec!["+44 1", "4402", "4404"]);
    }

    #[test]
    fn test_values_from_unexpected_shape() {
        assert!(values_from_json(&json!({"data": [1, 2]})).is_empty());
        assert!(values_from_json(&json!("123")).is_empty());
    }

    #[test]
    fn test_endpoint_uses_origin() {
        let extractor = JsonExtractor::new(fetcher(), "/api/numbers");
        let endpoint = extractor
            .endpoint("https://example.com:8443/country/uk?page=2")
            .unwrap();
        assert!(endpoint.starts_with("https://example.com:8443/api/numbers?_="));
    }

    #[tokio::test]
    async fn test_extract_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/numbers"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["9", "8"]"#))
            .mount(&server)
            .await;

        let extractor = JsonExtractor::new(fetcher(), "/api/numbers");
        let url = format!("{}/list", server.uri());
        let page = Page {
            url: &url,
            body: "",
            kind: None,
        };

        assert_eq!(extractor.try_extract(&page).await.unwrap(), vec!["9", "8"]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_strategy_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/numbers"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let extractor = JsonExtractor::new(fetcher(), "/api/numbers");
        let url = server.uri();
        let page = Page {
            url: &url,
            body: "",
            kind: None,
        };

        assert!(matches!(
            extractor.try_extract(&page).await,
            Err(ExtractError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_http_error_is_a_strategy_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let extractor = JsonExtractor::new(fetcher(), "/api/numbers");
        let url = server.uri();
        let page = Page {
            url: &url,
            body: "",
            kind: None,
        };

        assert!(matches!(
            extractor.try_extract(&page).await,
            Err(ExtractError::Http(_))
        ));
    }
}
