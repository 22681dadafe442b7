//! Manifest loading: fetch the item list, validate it, retry on network
//! failure.

use crate::config::NetworkSettings;
use crate::error::{FetchError, GalleryError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

/// One gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestItem {
    pub image_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl ManifestItem {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            title: None,
            alt: None,
        }
    }
}

/// Async byte fetcher. Network access lives behind this trait.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP(S) fetcher backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Local filesystem fetcher; URLs are paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .map_err(|e| FetchError::Io(format!("{path}: {e}")))
    }
}

pub fn is_remote_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Sends `http(s)://` locations to one fetcher and everything else
/// (paths, `file://`) to another.
#[derive(Debug, Clone, Default)]
pub struct RoutingFetcher<R = HttpFetcher, L = FileFetcher> {
    remote: R,
    local: L,
}

impl RoutingFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with(HttpFetcher::new(client), FileFetcher)
    }
}

impl<R, L> RoutingFetcher<R, L> {
    pub fn with(remote: R, local: L) -> Self {
        Self { remote, local }
    }
}

#[async_trait]
impl<R: Fetcher, L: Fetcher> Fetcher for RoutingFetcher<R, L> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if is_remote_url(url) {
            self.remote.fetch(url).await
        } else {
            self.local.fetch(url).await
        }
    }
}

/// Parse and validate a manifest body.
///
/// The body must be a JSON array whose entries each carry a string
/// `imageUrl`. An empty array is valid here; layout rejects it.
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<ManifestItem>, GalleryError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| GalleryError::Validation {
        index: None,
        reason: format!("malformed JSON: {e}"),
    })?;

    let Value::Array(entries) = value else {
        return Err(GalleryError::Validation {
            index: None,
            reason: "gallery data must be an array".to_string(),
        });
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let has_url = entry
                .get("imageUrl")
                .and_then(Value::as_str)
                .is_some_and(|url| !url.is_empty());
            if !has_url {
                return Err(GalleryError::Validation {
                    index: Some(index),
                    reason: "invalid or missing imageUrl".to_string(),
                });
            }
            serde_json::from_value(entry).map_err(|e| GalleryError::Validation {
                index: Some(index),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Fetches the manifest with bounded retries.
pub struct ManifestLoader<'a> {
    fetcher: &'a dyn Fetcher,
    settings: NetworkSettings,
}

impl<'a> ManifestLoader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, settings: NetworkSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Fetch and validate the manifest.
    ///
    /// Each attempt is bounded by the configured timeout; a timed-out
    /// request is dropped, which aborts it. Network failures retry after
    /// `retry_delay * attempt`. Validation failures are returned at once.
    pub async fn load(&self, url: &str) -> Result<Vec<ManifestItem>, GalleryError> {
        let max_attempts = self.settings.max_retries.max(1);
        let attempt_timeout = Duration::from_millis(self.settings.timeout_ms);
        let mut last_error = FetchError::Transport("no attempt made".to_string());

        for attempt in 1..=max_attempts {
            match timeout(attempt_timeout, self.fetcher.fetch(url)).await {
                Ok(Ok(bytes)) => {
                    let items = parse_manifest(&bytes)?;
                    info!(count = items.len(), url, "loaded gallery manifest");
                    return Ok(items);
                }
                Ok(Err(e)) => last_error = e,
                Err(_) => last_error = FetchError::Timeout(attempt_timeout),
            }

            warn!(attempt, max_attempts, error = %last_error, "manifest fetch attempt failed");

            if attempt < max_attempts {
                let backoff = self.settings.retry_delay_ms.saturating_mul(u64::from(attempt));
                sleep(Duration::from_millis(backoff)).await;
            }
        }

        error!(attempts = max_attempts, error = %last_error, "giving up on gallery manifest");
        Err(GalleryError::ManifestFetch {
            attempts: max_attempts,
            source: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    const MANIFEST: &[u8] = br#"[
        { "imageUrl": "https://img.example.com/a?w=1200&q=90", "title": "A" },
        { "imageUrl": "https://img.example.com/b?w=1200&q=90", "alt": "b", "extra": 1 }
    ]"#;

    /// Fails the first `failures` calls, then serves `body`.
    struct FlakyFetcher {
        failures: u32,
        calls: AtomicU32,
        body: Vec<u8>,
    }

    #[async_trait]
    impl Fetcher for FlakyFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FetchError::Status(503))
            } else {
                Ok(self.body.clone())
            }
        }
    }

    /// Never answers.
    struct HangingFetcher {
        started: Mutex<u32>,
    }

    #[async_trait]
    impl Fetcher for HangingFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            *self.started.lock().unwrap() += 1;
            std::future::pending().await
        }
    }

    /// Answers with its own name and the URL it was asked for.
    struct NamedFetcher(&'static str);

    #[async_trait]
    impl Fetcher for NamedFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(format!("{}:{url}", self.0).into_bytes())
        }
    }

    fn settings(max_retries: u32) -> NetworkSettings {
        NetworkSettings {
            max_retries,
            ..NetworkSettings::default()
        }
    }

    #[test]
    fn test_parse_valid_manifest() {
        let items = parse_manifest(MANIFEST).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("A"));
        assert_eq!(items[1].alt.as_deref(), Some("b"));
        assert_eq!(items[1].title, None);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_manifest(br#"{ "imageUrl": "x" }"#).unwrap_err();
        assert!(matches!(err, GalleryError::Validation { index: None, .. }));
    }

    #[test]
    fn test_parse_names_offending_index() {
        let err = parse_manifest(br#"[{ "imageUrl": "a" }, { "title": "no url" }]"#).unwrap_err();
        assert!(matches!(err, GalleryError::Validation { index: Some(1), .. }));

        let err = parse_manifest(br#"[{ "imageUrl": 7 }]"#).unwrap_err();
        assert!(matches!(err, GalleryError::Validation { index: Some(0), .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success_within_three_attempts() {
        let fetcher = FlakyFetcher {
            failures: 2,
            calls: AtomicU32::new(0),
            body: MANIFEST.to_vec(),
        };
        let items = ManifestLoader::new(&fetcher, settings(3))
            .load("gallery-images.json")
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_is_fatal() {
        let fetcher = FlakyFetcher {
            failures: 10,
            calls: AtomicU32::new(0),
            body: MANIFEST.to_vec(),
        };
        let err = ManifestLoader::new(&fetcher, settings(3))
            .load("gallery-images.json")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GalleryError::ManifestFetch { attempts: 3, source: FetchError::Status(503) }
        ));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_linearly() {
        let fetcher = FlakyFetcher {
            failures: 2,
            calls: AtomicU32::new(0),
            body: MANIFEST.to_vec(),
        };
        let start = tokio::time::Instant::now();
        ManifestLoader::new(&fetcher, settings(3)).load("m.json").await.unwrap();
        // 1000ms after the first failure, 2000ms after the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_error_is_not_retried() {
        let fetcher = FlakyFetcher {
            failures: 0,
            calls: AtomicU32::new(0),
            body: br#"[{ "title": "broken" }]"#.to_vec(),
        };
        let err = ManifestLoader::new(&fetcher, settings(3)).load("m.json").await.unwrap_err();
        assert!(matches!(err, GalleryError::Validation { index: Some(0), .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_times_out() {
        let fetcher = HangingFetcher {
            started: Mutex::new(0),
        };
        let err = ManifestLoader::new(&fetcher, settings(2)).load("m.json").await.unwrap_err();
        assert!(matches!(
            err,
            GalleryError::ManifestFetch { attempts: 2, source: FetchError::Timeout(_) }
        ));
        assert_eq!(*fetcher.started.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_routing_splits_remote_and_local() {
        let fetcher = RoutingFetcher::with(NamedFetcher("remote"), NamedFetcher("local"));
        for url in ["https://images.unsplash.com/photo-1?w=400&q=80", "http://localhost/a.jpg"] {
            assert!(fetcher.fetch(url).await.unwrap().starts_with(b"remote:"));
        }
        for url in ["gallery-images.json", "photos/a.jpg", "file:///tmp/a.jpg"] {
            assert!(fetcher.fetch(url).await.unwrap().starts_with(b"local:"));
        }
    }

    #[tokio::test]
    async fn test_routing_reads_local_manifest_from_disk() {
        let path = std::env::temp_dir().join(format!("canvas-gallery-manifest-{}.json", std::process::id()));
        std::fs::write(&path, MANIFEST).unwrap();

        let fetcher = RoutingFetcher::with(NamedFetcher("remote"), FileFetcher);
        let bytes = fetcher.fetch(path.to_str().unwrap()).await;
        std::fs::remove_file(&path).unwrap();

        assert_eq!(bytes.unwrap(), MANIFEST);
    }
}
