//! Engine configuration shared by the bundled backends.

use std::time::Duration;

/// Chrome-like user agent; plenty of origins serve degraded markup to
/// unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36";

/// Configuration for the engines and the backends they provision.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent sent by the static fetch backend.
    pub user_agent: String,
    /// Per-request timeout for static fetches.
    pub request_timeout: Duration,
    /// Timeout for browser navigation.
    pub navigation_timeout: Duration,
    /// Maximum redirects the static fetch will follow.
    pub max_redirects: usize,
    /// Bounded retry count for transient fetch failures (5xx / transport).
    /// Retry policy lives in the backend, never in the orchestrator.
    pub fetch_retries: u32,
    /// Launch the browser headless.
    pub headless: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(30),
            max_redirects: 5,
            fetch_retries: 2,
            headless: true,
        }
    }
}

impl EngineConfig {
    /// Override the static-fetch user agent.
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Override both the request and navigation timeouts.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self.navigation_timeout = timeout;
        self
    }

    /// Disable backend-level fetch retries.
    pub fn without_retries(mut self) -> Self {
        self.fetch_retries = 0;
        self
    }
}
