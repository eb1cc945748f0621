#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub enrich_group_size: usize,
    pub proxy_urls: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("enrich_group_size", &self.enrich_group_size)
            .field(
                "proxy_urls",
                &self
                    .proxy_urls
                    .iter()
                    .map(|url| redact_proxy_url(url))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Replaces the `user:password@` part of a proxy URL, if any.
#[must_use]
pub fn redact_proxy_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    match rest.rsplit_once('@') {
        Some((_, host)) if scheme.is_empty() => format!("[redacted]@{host}"),
        Some((_, host)) => format!("{scheme}://[redacted]@{host}"),
        None => url.to_owned(),
    }
}
