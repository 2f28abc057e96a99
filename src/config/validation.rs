use crate::config::types::{
    Config, FetchConfig, OutputConfig, SessionEntry, SiteConfig, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sessions(&config.sessions)?;
    Ok(())
}

/// Validates the site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    for (name, template) in [
        ("pdf_fallback_path", &config.pdf_fallback_path),
        ("doi_template", &config.doi_template),
    ] {
        if let Some(template) = template {
            if !template.contains("{paper_id}") {
                return Err(ConfigError::Validation(format!(
                    "{} must contain the {{paper_id}} placeholder, got '{}'",
                    name, template
                )));
            }
        }
    }

    Ok(())
}

/// Longest delay or backoff base accepted (seconds)
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Validates request pacing and retry settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("delay_min_secs", config.delay_min_secs),
        ("delay_max_secs", config.delay_max_secs),
        ("backoff_base_secs", config.backoff_base_secs),
    ] {
        if value > MAX_DELAY_SECS {
            return Err(ConfigError::Validation(format!(
                "{} must be <= {}, got {}",
                name, MAX_DELAY_SECS, value
            )));
        }
    }

    if !config.delay_min_secs.is_finite() || config.delay_min_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay_min_secs must be >= 0, got {}",
            config.delay_min_secs
        )));
    }

    if !config.delay_max_secs.is_finite() || config.delay_max_secs < config.delay_min_secs {
        return Err(ConfigError::Validation(format!(
            "delay_max_secs must be >= delay_min_secs ({}), got {}",
            config.delay_min_secs, config.delay_max_secs
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if !config.backoff_base_secs.is_finite() || config.backoff_base_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_base_secs must be >= 0, got {}",
            config.backoff_base_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if let Some(prefix) = &config.file_prefix {
        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "file_prefix cannot contain path separators, got '{}'",
                prefix
            )));
        }
    }

    Ok(())
}

/// Validates the explicit session table
fn validate_sessions(sessions: &[SessionEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in sessions {
        let code = entry.code.trim();
        if code.is_empty() {
            return Err(ConfigError::Validation(
                "session code cannot be empty".to_string(),
            ));
        }

        if !seen.insert(code.to_string()) {
            return Err(ConfigError::Validation(format!(
                "session code '{}' is listed more than once",
                code
            )));
        }

        if entry.url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "session '{}' has an empty url",
                code
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
