//! JSON fetching with linear-backoff retry

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Request timeout for catalog endpoints
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid JSON from {url}: {message}")]
    Body { url: String, message: String },
}

/// Something that can GET a URL and hand back parsed JSON
pub trait JsonFetcher {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// `reqwest`-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("frogtools/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl JsonFetcher for HttpFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Attempt count and backoff step.
///
/// After failed attempt `n` the wait is `n * step`, so the catalog policy
/// waits 1s then 2s between its three attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub step: Duration,
}

impl RetryPolicy {
    pub const CATALOG: RetryPolicy = RetryPolicy {
        max_retries: 3,
        step: Duration::from_secs(1),
    };

    pub const fn new(max_retries: u32, step: Duration) -> Self {
        Self { max_retries, step }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::CATALOG
    }
}

/// Run `f` until it succeeds or `policy.max_retries` attempts have failed.
/// The last error is returned.
pub async fn with_retry<F, Fut, T, E>(operation_name: &str, policy: RetryPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_retries = policy.max_retries.max(1);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}/{}", operation_name, attempt, max_retries);
                }
                return Ok(result);
            }
            Err(e) => {
                warn!(
                    "{} failed (attempt {}/{}): {}",
                    operation_name, attempt, max_retries, e
                );
                if attempt >= max_retries {
                    return Err(e);
                }
                let delay = policy.delay_after(attempt);
                info!("Retrying in {:?}...", delay);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// GET `url` as JSON with retry
pub async fn fetch_with_retry<F: JsonFetcher>(
    fetcher: &F,
    url: &str,
    policy: RetryPolicy,
) -> Result<Value, FetchError> {
    with_retry(url, policy, || fetcher.get_json(url)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then returns `{"ok": true}`
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl JsonFetcher for Flaky {
        async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 503,
                })
            } else {
                Ok(json!({"ok": true}))
            }
        }
    }

    const FAST: RetryPolicy = RetryPolicy::new(3, Duration::ZERO);

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let fetcher = Flaky::new(2);
        let value = fetch_with_retry(&fetcher, "https://cdn/x.json", FAST).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let fetcher = Flaky::new(u32::MAX);
        let err = fetch_with_retry(&fetcher, "https://cdn/x.json", FAST).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        assert_eq!(fetcher.calls(), 3);
    }

    #[test]
    fn test_catalog_backoff_is_linear() {
        let policy = RetryPolicy::CATALOG;
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(3));
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_http_fetcher_versions() {
        let fetcher = HttpFetcher::new().unwrap();
        let value = fetcher
            .get_json("https://ddragon.leagueoflegends.com/api/versions.json")
            .await
            .unwrap();
        assert!(value.as_array().is_some_and(|v| !v.is_empty()));
    }
}
