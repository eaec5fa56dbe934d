use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{FetchError, Result};

// ─── RateLimitedClient ───────────────────────────────────────────────────────

/// HTTP client that spaces requests at least `min_interval` apart, honors
/// `Retry-After` on 429 and retries transport errors with exponential
/// backoff.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(min_interval: Duration, max_retries: u32, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            min_interval,
            last_request: Mutex::new(None),
            max_retries,
        }
    }

    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            self.pace().await;
            match self.client.get(url).headers(headers.clone()).send().await {
                Ok(resp) if resp.status() == 404 => {
                    return Err(FetchError::NotFound(url.to_string()));
                }
                Ok(resp) if resp.status() == 429 => {
                    if attempt >= self.max_retries {
                        return Err(FetchError::RateLimit(url.to_string(), 60));
                    }
                    let wait = resp
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(resp) if !resp.status().is_success() => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(FetchError::Api(
                        url.to_string(),
                        format!("HTTP {status}: {body}"),
                    ));
                }
                Ok(resp) => return resp.text().await.map_err(FetchError::Http),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(FetchError::Http(e));
                    }
                    sleep(Duration::from_secs(2u64.pow(attempt))).await;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_headers(url, HeaderMap::new()).await
    }

    pub async fn get_json_with_headers<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T> {
        let text = self.get_with_headers(url, headers).await?;
        serde_json::from_str(&text).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

// ─── DiskCache ───────────────────────────────────────────────────────────────

/// TTL cache for provider responses under the user's local data directory.
/// A zero TTL disables it entirely.
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

#[derive(Serialize, serde::Deserialize)]
struct CacheEntry<T> {
    stored_at: u64, // Unix timestamp secs
    value: T,
}

impl DiskCache {
    pub fn new(namespace: &str, ttl: Duration) -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("citescope")
            .join("cache")
            .join(namespace);
        if !ttl.is_zero() {
            let _ = std::fs::create_dir_all(&dir);
        }
        Self { dir, ttl }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if self.ttl.is_zero() {
            return None;
        }
        let path = cache_key_to_path(&self.dir, key);
        let data = tokio::fs::read(&path).await.ok()?;
        let entry: CacheEntry<T> = serde_json::from_slice(&data).ok()?;
        if now_secs().saturating_sub(entry.stored_at) > self.ttl.as_secs() {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(entry.value)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        if self.ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            stored_at: now_secs(),
            value,
        };
        if let Ok(data) = serde_json::to_vec(&entry) {
            let path = cache_key_to_path(&self.dir, key);
            let _ = tokio::fs::write(&path, data).await;
        }
    }
}

fn cache_key_to_path(dir: &Path, key: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    dir.join(format!("{hash:016x}.json"))
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_namespace(label: &str) -> String {
        format!("test_{label}_{}", std::process::id())
    }

    #[tokio::test]
    async fn cache_round_trips_within_ttl() {
        let cache = DiskCache::new(&test_namespace("roundtrip"), Duration::from_secs(60));
        cache.set("key1", &"hello world").await;
        let val: Option<String> = cache.get("key1").await;
        assert_eq!(val, Some("hello world".to_string()));
    }

    #[tokio::test]
    async fn zero_ttl_disables_the_cache() {
        let cache = DiskCache::new(&test_namespace("disabled"), Duration::ZERO);
        cache.set("key1", &42u32).await;
        let val: Option<u32> = cache.get("key1").await;
        assert_eq!(val, None);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, 3, "citescope-test");
        let err = client
            .get(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_surface_with_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, 0, "citescope-test");
        let err = client
            .get(&format!("{}/broken", server.url()))
            .await
            .unwrap_err();
        match err {
            FetchError::Api(_, message) => assert!(message.contains("500")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
