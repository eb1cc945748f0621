use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://www.google.com/maps";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("MAPSIFT_LOG_LEVEL", "info");
    let base_url = or_default("MAPSIFT_BASE_URL", DEFAULT_BASE_URL)
        .trim_end_matches('/')
        .to_owned();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "MAPSIFT_BASE_URL",
            format!("expected an http(s) URL, got \"{base_url}\""),
        ));
    }
    let user_agent = or_default("MAPSIFT_USER_AGENT", DEFAULT_USER_AGENT);

    let request_timeout_secs = parse_u64("MAPSIFT_REQUEST_TIMEOUT_SECS", "30")?;
    let max_attempts = parse_u32("MAPSIFT_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid("MAPSIFT_MAX_ATTEMPTS", "must be at least 1".into()));
    }
    let retry_base_delay_ms = parse_u64("MAPSIFT_RETRY_BASE_DELAY_MS", "3000")?;

    let rate_limit_requests = parse_u32("MAPSIFT_RATE_LIMIT_REQUESTS", "30")?;
    if rate_limit_requests == 0 {
        return Err(invalid(
            "MAPSIFT_RATE_LIMIT_REQUESTS",
            "must be at least 1".into(),
        ));
    }
    let rate_limit_window_secs = parse_u64("MAPSIFT_RATE_LIMIT_WINDOW_SECS", "60")?;

    let enrich_group_size = parse_usize("MAPSIFT_ENRICH_GROUP_SIZE", "3")?;
    if enrich_group_size == 0 {
        return Err(invalid(
            "MAPSIFT_ENRICH_GROUP_SIZE",
            "must be at least 1".into(),
        ));
    }

    let proxy_urls = parse_proxy_urls(&or_default("MAPSIFT_PROXY_URLS", ""));

    Ok(AppConfig {
        log_level,
        base_url,
        user_agent,
        request_timeout_secs,
        max_attempts,
        retry_base_delay_ms,
        rate_limit_requests,
        rate_limit_window_secs,
        enrich_group_size,
        proxy_urls,
    })
}

/// Split a comma-separated proxy list, dropping blank entries.
fn parse_proxy_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
