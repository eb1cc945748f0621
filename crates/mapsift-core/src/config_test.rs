use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.log_level, "info");
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.retry_base_delay_ms, 3_000);
    assert_eq!(config.rate_limit_requests, 30);
    assert_eq!(config.rate_limit_window_secs, 60);
    assert_eq!(config.enrich_group_size, 3);
    assert!(config.proxy_urls.is_empty());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("MAPSIFT_BASE_URL", "http://127.0.0.1:9999/maps/");
    map.insert("MAPSIFT_MAX_ATTEMPTS", "5");
    map.insert("MAPSIFT_RETRY_BASE_DELAY_MS", "10");
    map.insert("MAPSIFT_ENRICH_GROUP_SIZE", "2");
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.base_url, "http://127.0.0.1:9999/maps");
    assert_eq!(config.max_attempts, 5);
    assert_eq!(config.retry_base_delay_ms, 10);
    assert_eq!(config.enrich_group_size, 2);
}

#[test]
fn build_app_config_rejects_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("MAPSIFT_REQUEST_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPSIFT_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(MAPSIFT_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_attempts() {
    let mut map = HashMap::new();
    map.insert("MAPSIFT_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPSIFT_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(MAPSIFT_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_group_size() {
    let mut map = HashMap::new();
    map.insert("MAPSIFT_ENRICH_GROUP_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPSIFT_ENRICH_GROUP_SIZE"
    ));
}

#[test]
fn build_app_config_rejects_zero_rate_limit() {
    let mut map = HashMap::new();
    map.insert("MAPSIFT_RATE_LIMIT_REQUESTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPSIFT_RATE_LIMIT_REQUESTS"
    ));
}

#[test]
fn build_app_config_rejects_non_http_base_url() {
    let mut map = HashMap::new();
    map.insert("MAPSIFT_BASE_URL", "ftp://example.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPSIFT_BASE_URL"
    ));
}

#[test]
fn parse_proxy_urls_splits_and_trims() {
    assert_eq!(
        parse_proxy_urls(" http://a:1 , ,http://b:2,"),
        vec!["http://a:1".to_owned(), "http://b:2".to_owned()]
    );
    assert!(parse_proxy_urls("").is_empty());
}
