use crate::config::RewriteRule;

/// Applies the first matching host-prefix rewrite to a source URL
///
/// Rules are checked in configuration order; the first rule whose `from`
/// prefix matches replaces that prefix with `to`. URLs that match no rule are
/// returned unchanged.
pub fn apply_rewrites(url: &str, rules: &[RewriteRule]) -> String {
    for rule in rules {
        if let Some(rest) = url.strip_prefix(rule.from.as_str()) {
            return format!("{}{}", rule.to, rest);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(from: &str, to: &str) -> RewriteRule {
        RewriteRule {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn test_no_rules() {
        assert_eq!(apply_rewrites("https://a.com/x", &[]), "https://a.com/x");
    }

    #[test]
    fn test_prefix_substitution() {
        let rules = vec![rule("https://old.example.com", "https://example.com")];
        assert_eq!(
            apply_rewrites("https://old.example.com/numbers/uk", &rules),
            "https://example.com/numbers/uk"
        );
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            rule("https://a.com", "https://b.com"),
            rule("https://a.com/x", "https://c.com"),
        ];
        assert_eq!(apply_rewrites("https://a.com/x", &rules), "https://b.com/x");
    }

    #[test]
    fn test_non_matching_rule_ignored() {
        let rules = vec![rule("https://other.com", "https://b.com")];
        assert_eq!(apply_rewrites("https://a.com/", &rules), "https://a.com/");
    }
}
