use crate::config::types::{
    ApiConfig, Config, FetchConfig, FlagConfig, MonitorConfig, ParserConfig, RepeatConfig,
    RewriteRule, SourceConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_monitor_config(&config.monitor)?;
    validate_fetch_config(&config.fetch)?;
    validate_parser_config(&config.parser)?;
    validate_flag_config(&config.flags)?;
    validate_repeat_config(&config.repeat)?;
    if let Some(api) = &config.api {
        validate_api_config(api)?;
    }
    validate_rewrites(&config.rewrite)?;
    validate_sources(&config.source)?;

    if config.storage.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_monitor_config(config: &MonitorConfig) -> Result<(), ConfigError> {
    if config.check_interval == 0 {
        return Err(ConfigError::Validation(
            "check_interval must be at least 1 second".to_string(),
        ));
    }
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "fetch timeout must be greater than 0ms".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_parser_config(config: &ParserConfig) -> Result<(), ConfigError> {
    if config.single_selectors.is_empty() || config.multiple_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "selector lists cannot be empty".to_string(),
        ));
    }

    for selector in config
        .single_selectors
        .iter()
        .chain(config.multiple_selectors.iter())
    {
        if scraper::Selector::parse(selector).is_err() {
            return Err(ConfigError::Validation(format!(
                "invalid CSS selector '{}'",
                selector
            )));
        }
    }

    if !config.json_suffix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "json_suffix must start with '/', got '{}'",
            config.json_suffix
        )));
    }

    if config.failure_threshold == 0 {
        return Err(ConfigError::Validation(
            "failure_threshold must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_flag_config(config: &FlagConfig) -> Result<(), ConfigError> {
    if !config.template.contains("{iso}") {
        return Err(ConfigError::Validation(format!(
            "flag template must contain '{{iso}}', got '{}'",
            config.template
        )));
    }
    Ok(())
}

fn validate_repeat_config(config: &RepeatConfig) -> Result<(), ConfigError> {
    if config.interval == 0 {
        return Err(ConfigError::Validation(
            "repeat interval must be at least 1 second".to_string(),
        ));
    }
    if config.tick == 0 {
        return Err(ConfigError::Validation(
            "repeat tick must be greater than 0ms".to_string(),
        ));
    }
    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.base_url, "api base_url")?;
    if config.key.is_empty() {
        return Err(ConfigError::Validation("api key cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_rewrites(rules: &[RewriteRule]) -> Result<(), ConfigError> {
    for rule in rules {
        if rule.from.is_empty() {
            return Err(ConfigError::Validation(
                "rewrite 'from' prefix cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for source in sources {
        if source.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source id cannot be empty".to_string(),
            ));
        }

        if !seen.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id '{}'",
                source.id
            )));
        }

        validate_http_url(&source.url, &format!("source '{}'", source.id))?;

        if source.check_interval == Some(0) {
            return Err(ConfigError::Validation(format!(
                "source '{}' check_interval must be at least 1 second",
                source.id
            )));
        }
    }

    Ok(())
}

fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} URL '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} URL '{}' must use http or https",
            what, raw
        )));
    }

    Ok(())
}
