/// Process-level transport settings, loaded from the environment.
///
/// Per-run harvest limits live in [`crate::RunBudget`]; this struct only
/// covers how requests are made.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Scheme + host every generated URL is rooted at, e.g. `https://www.reddit.com`.
    pub platform_origin: String,
    pub request_timeout_secs: u64,
    pub retry_backoff_base_ms: u64,
    pub pause_min_ms: u64,
    pub pause_max_ms: u64,
    /// Requests a session may serve before it is retired.
    pub session_max_usage: u32,
    pub session_pool_size: usize,
}

impl AppConfig {
    /// Host part of [`Self::platform_origin`], used for seed URL acceptance
    /// and same-platform link detection.
    #[must_use]
    pub fn platform_host(&self) -> String {
        reqwest::Url::parse(&self.platform_origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_else(|| "www.reddit.com".to_owned())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            platform_origin: crate::DEFAULT_PLATFORM_ORIGIN.to_owned(),
            request_timeout_secs: 30,
            retry_backoff_base_ms: 1_000,
            pause_min_ms: 120,
            pause_max_ms: 400,
            session_max_usage: 20,
            session_pool_size: 10,
        }
    }
}
