//! HTTP fetch layer for the static backend.
//!
//! Not a browser: one GET per document, with limited redirects, a
//! per-request timeout, and bounded retry on 5xx and transport errors.
//! Retry lives here because it is backend policy; the orchestrator never
//! retries anything.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use std::time::Duration;

/// HTTP client used by [`StaticQueryCore`](super::StaticQueryCore).
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: u32,
}

impl HttpFetcher {
    /// Build a client from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_default();

        Self {
            client,
            retries: config.fetch_retries,
        }
    }

    /// GET the URL and return the response body.
    ///
    /// 5xx responses and transport errors are retried with exponential
    /// backoff up to the configured bound; any other non-success status is
    /// an immediate [`EngineError::HttpStatus`].
    pub async fn fetch(&self, url: &str) -> EngineResult<String> {
        let mut attempt = 0u32;

        loop {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_server_error() && attempt < self.retries {
                        attempt += 1;
                        tokio::time::sleep(backoff(attempt)).await;
                        continue;
                    }
                    if !status.is_success() {
                        return Err(EngineError::HttpStatus {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    return Ok(resp.text().await?);
                }
                Err(e) => {
                    if attempt < self.retries {
                        attempt += 1;
                        tokio::time::sleep(backoff(attempt)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * 2u64.pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1000));
        assert_eq!(backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn fetcher_builds_from_config() {
        let fetcher = HttpFetcher::new(&EngineConfig::default());
        assert_eq!(fetcher.retries, 2);
    }
}
