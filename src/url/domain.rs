use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use numwatch::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the strategy cache key for a URL string
///
/// The scheme and a leading `www.` are stripped, as are any path, query and
/// port. Strings that do not parse as URLs fall back to a textual strip so a
/// key is always produced.
///
/// # Examples
///
/// ```
/// use numwatch::url::domain_key;
///
/// assert_eq!(domain_key("https://www.example.com/numbers"), "example.com");
/// assert_eq!(domain_key("http://sub.example.com:8080/"), "sub.example.com");
/// ```
pub fn domain_key(url: &str) -> String {
    let host = match Url::parse(url) {
        Ok(parsed) => extract_domain(&parsed).unwrap_or_default(),
        Err(_) => {
            let without_scheme = url.split("//").last().unwrap_or(url);
            let host = without_scheme.split('/').next().unwrap_or(without_scheme);
            host.split(':').next().unwrap_or(host).to_lowercase()
        }
    };

    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}
