use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, Result};

/// Explicit fetcher configuration. Endpoints, pacing and credentials are
/// all carried here and passed into the clients; nothing is a process-wide
/// global.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub openalex_base_url: String,
    pub semantic_scholar_base_url: String,

    /// Contact e-mail advertised in the User-Agent for polite-pool access.
    pub contact_email: Option<String>,

    /// Raises the Semantic Scholar rate limit when set.
    pub semantic_scholar_api_key: Option<String>,

    /// Minimum delay between requests to one provider. The default is
    /// conservative; the free Semantic Scholar tier allows 100 requests per
    /// five minutes.
    pub request_interval_ms: u64,

    pub max_retries: u32,

    /// Cap on citing works (and paginated references) fetched per paper.
    pub max_citing: u32,

    /// Response cache time-to-live in seconds; 0 disables caching.
    pub cache_ttl_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            openalex_base_url: "https://api.openalex.org".to_string(),
            semantic_scholar_base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            contact_email: None,
            semantic_scholar_api_key: None,
            request_interval_ms: 5_000,
            max_retries: 3,
            max_citing: 500,
            cache_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl FetchConfig {
    /// Load from a TOML file, or fall back to defaults when no path is
    /// given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text).map_err(|e| FetchError::Config(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn user_agent(&self) -> String {
        match self.contact_email.as_deref() {
            Some(email) => format!("citescope/0.1 (mailto:{email})"),
            None => "citescope/0.1".to_string(),
        }
    }
}
