use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::store::{validate_object_name, BlobStore};

const BASE_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_MS: u64 = 5_000;
const MAX_JITTER_MS: u64 = 250;

/// Feed blobs served over HTTP from an object-storage bucket root, e.g.
/// `https://storage.googleapis.com/<bucket>/`.
pub struct HttpBlobStore {
    http: Client,
    base_url: Url,
    max_attempts: u32,
}

impl HttpBlobStore {
    pub fn new(base_url: &str, max_attempts: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpBlobStore {
            http,
            base_url: normalize_base_url(base_url)?,
            max_attempts: max_attempts.max(1),
        })
    }

    fn object_url(&self, object: &str) -> Result<Url> {
        validate_object_name(object)?;
        self.base_url
            .join(object)
            .with_context(|| format!("Cannot build URL for object '{}'", object))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("Invalid feed base URL '{}'", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Exponential backoff before retry number `attempt` (1-based), capped.
pub fn retry_delay(attempt: u32, jitter_ms: u64) -> Duration {
    let exp = BASE_BACKOFF_MS.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
    Duration::from_millis(exp.min(MAX_BACKOFF_MS) + jitter_ms)
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, object: &str) -> Result<Vec<u8>> {
        let url = self.object_url(object)?;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!("Fetching feed blob {} (attempt {})", url, attempt);

            let failure = match self.http.get(url.clone()).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp
                        .bytes()
                        .await
                        .with_context(|| format!("Failed to read body of {}", url))?;
                    return Ok(body.to_vec());
                }
                Ok(resp) if is_retryable_status(resp.status()) => {
                    anyhow::anyhow!("feed store returned {} for {}", resp.status(), object)
                }
                Ok(resp) => {
                    anyhow::bail!("feed store returned {} for {}", resp.status(), object);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    anyhow::Error::new(e).context(format!("request for {} failed", object))
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("request for {} failed", object));
                }
            };

            if attempt >= self.max_attempts {
                return Err(failure.context(format!("giving up after {} attempts", attempt)));
            }

            let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
            let delay = retry_delay(attempt, jitter);
            warn!("{:#}; retrying in {:?}", failure, delay);
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_joins_under_bucket_root() {
        let store = HttpBlobStore::new("https://storage.example.com/dfs-feeds", 3).unwrap();
        let url = store.object_url("odds/nfl.json").unwrap();
        assert_eq!(url.as_str(), "https://storage.example.com/dfs-feeds/odds/nfl.json");

        let store = HttpBlobStore::new("https://storage.example.com/dfs-feeds/", 3).unwrap();
        let url = store.object_url("draftables/fanduel/nba/main.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.example.com/dfs-feeds/draftables/fanduel/nba/main.json"
        );
    }

    #[test]
    fn test_object_url_rejects_traversal() {
        let store = HttpBlobStore::new("https://storage.example.com/dfs-feeds", 3).unwrap();
        assert!(store.object_url("../secrets.json").is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpBlobStore::new("not a url", 3).is_err());
    }

    #[test]
    fn test_retry_delay_backs_off_and_caps() {
        assert_eq!(retry_delay(1, 0), Duration::from_millis(250));
        assert_eq!(retry_delay(2, 0), Duration::from_millis(500));
        assert_eq!(retry_delay(3, 10), Duration::from_millis(1_010));
        assert_eq!(retry_delay(30, 0), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }
}
