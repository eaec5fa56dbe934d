use serde_json::Value;
use tracing::warn;

use citescope_core::{PaperRecord, SourceTag};

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::http::{DiskCache, RateLimitedClient};

const REFERENCE_BATCH: usize = 50;
const CITING_PAGE: usize = 100;

pub struct OpenAlexClient {
    client: RateLimitedClient,
    cache: DiskCache,
    base_url: String,
}

impl OpenAlexClient {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            client: RateLimitedClient::new(
                config.request_interval(),
                config.max_retries,
                &config.user_agent(),
            ),
            cache: DiskCache::new("openalex", config.cache_ttl()),
            base_url: config.openalex_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a work by DOI. `Ok(None)` when OpenAlex does not know it.
    pub async fn work_by_doi(&self, doi: &str) -> Result<Option<Value>> {
        let cache_key = format!("work:{doi}");
        if let Some(cached) = self.cache.get::<Value>(&cache_key).await {
            return Ok(Some(cached));
        }

        let url = format!(
            "{}/works/https://doi.org/{}",
            self.base_url,
            urlencoding::encode(doi)
        );
        let body = match self.client.get(&url).await {
            Ok(body) => body,
            Err(FetchError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let work: Value =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        self.cache.set(&cache_key, &work).await;
        Ok(Some(work))
    }

    /// Resolve a work's `referenced_works` ids to full records, batching
    /// over the id filter. A failed batch is logged and skipped; the rest
    /// of the list still comes back.
    pub async fn references(&self, work: &Value) -> Result<Vec<PaperRecord>> {
        let ids: Vec<&str> = work
            .get("referenced_works")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut records = Vec::new();
        for chunk in ids.chunks(REFERENCE_BATCH) {
            let url = format!(
                "{}/works?filter=openalex:{}&per-page={}",
                self.base_url,
                chunk.join("|"),
                REFERENCE_BATCH
            );
            match self.client.get_json::<Value>(&url).await {
                Ok(page) => {
                    if let Some(results) = page.get("results").and_then(Value::as_array) {
                        records.extend(results.iter().map(record_from_work));
                    }
                }
                Err(e) => warn!("failed to fetch OpenAlex reference batch: {e}"),
            }
        }
        Ok(records)
    }

    /// Works citing `work`, via cursor pagination, capped at `max_results`.
    pub async fn citing_works(&self, work: &Value, max_results: usize) -> Result<Vec<PaperRecord>> {
        let Some(work_id) = work.get("id").and_then(Value::as_str) else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        let mut cursor = Some("*".to_string());
        while let Some(current) = cursor.take() {
            if records.len() >= max_results {
                break;
            }
            let url = format!(
                "{}/works?filter=cites:{}&per-page={}&cursor={}",
                self.base_url,
                work_id,
                CITING_PAGE,
                urlencoding::encode(&current)
            );
            let page: Value = match self.client.get_json(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("failed to fetch OpenAlex citing works: {e}");
                    break;
                }
            };
            let Some(results) = page.get("results").and_then(Value::as_array) else {
                break;
            };
            if results.is_empty() {
                break;
            }
            records.extend(results.iter().map(record_from_work));
            cursor = page
                .pointer("/meta/next_cursor")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned);
        }

        records.truncate(max_results);
        Ok(records)
    }
}

/// Map an OpenAlex work object to a metadata record.
pub fn record_from_work(work: &Value) -> PaperRecord {
    let authors = work
        .get("authorships")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|a| a.pointer("/author/display_name").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let doi = non_empty(work.get("doi"))
        .map(|doi| doi.strip_prefix("https://doi.org/").unwrap_or(&doi).to_string());

    PaperRecord {
        openalex_id: non_empty(work.get("id")),
        doi,
        title: non_empty(work.get("title")),
        authors,
        year: work
            .get("publication_year")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok()),
        venue: work
            .pointer("/primary_location/source/display_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned),
        work_type: non_empty(work.get("type")),
        cited_by_count: work.get("cited_by_count").and_then(Value::as_u64),
        source: Some(SourceTag::OpenAlex),
        ..Default::default()
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn test_config(base_url: String) -> FetchConfig {
        FetchConfig {
            openalex_base_url: base_url,
            request_interval_ms: 0,
            max_retries: 0,
            cache_ttl_secs: 0,
            ..Default::default()
        }
    }

    fn work_fixture() -> Value {
        json!({
            "id": "https://openalex.org/W2741809807",
            "doi": "https://doi.org/10.1038/nature14539",
            "title": "Deep learning",
            "publication_year": 2015,
            "cited_by_count": 50000,
            "type": "article",
            "authorships": [
                { "author": { "display_name": "Yann LeCun" } },
                { "author": { "display_name": "Yoshua Bengio" } },
                { "author": {} }
            ],
            "primary_location": {
                "source": { "display_name": "Nature" }
            },
            "referenced_works": ["https://openalex.org/W1", "https://openalex.org/W2"]
        })
    }

    #[test]
    fn work_maps_to_a_record() {
        let record = record_from_work(&work_fixture());
        assert_eq!(record.doi.as_deref(), Some("10.1038/nature14539"));
        assert_eq!(record.title.as_deref(), Some("Deep learning"));
        assert_eq!(record.authors, vec!["Yann LeCun", "Yoshua Bengio"]);
        assert_eq!(record.year, Some(2015));
        assert_eq!(record.venue.as_deref(), Some("Nature"));
        assert_eq!(record.cited_by_count, Some(50000));
        assert_eq!(record.source, Some(SourceTag::OpenAlex));
        assert!(record.arxiv_id.is_none());
    }

    #[test]
    fn sparse_work_maps_to_a_sparse_record() {
        let record = record_from_work(&json!({ "id": "https://openalex.org/W9", "title": "" }));
        assert_eq!(
            record.openalex_id.as_deref(),
            Some("https://openalex.org/W9")
        );
        assert!(record.title.is_none());
        assert!(record.venue.is_none());
        assert!(record.authors.is_empty());
    }

    #[tokio::test]
    async fn fetches_a_work_by_doi() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/works/https://doi.org/10.1038%2Fnature14539")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(work_fixture().to_string())
            .create_async()
            .await;

        let client = OpenAlexClient::new(&test_config(server.url()));
        let work = client.work_by_doi("10.1038/nature14539").await.unwrap();
        assert_eq!(
            work.unwrap().get("title").and_then(Value::as_str),
            Some("Deep learning")
        );
    }

    #[tokio::test]
    async fn unknown_doi_is_none_not_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex("^/works/.*".to_string()))
            .with_status(404)
            .create_async()
            .await;

        let client = OpenAlexClient::new(&test_config(server.url()));
        let work = client.work_by_doi("10.1/missing").await.unwrap();
        assert!(work.is_none());
    }

    #[tokio::test]
    async fn citing_works_follow_the_cursor_until_exhausted() {
        let mut server = Server::new_async().await;
        let first = json!({
            "results": [ { "id": "https://openalex.org/W10", "title": "Citing one" } ],
            "meta": { "next_cursor": "abc" }
        });
        let second = json!({
            "results": [ { "id": "https://openalex.org/W11", "title": "Citing two" } ],
            "meta": { "next_cursor": null }
        });
        let _page1 = server
            .mock("GET", "/works")
            .match_query(Matcher::UrlEncoded("cursor".into(), "*".into()))
            .with_status(200)
            .with_body(first.to_string())
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/works")
            .match_query(Matcher::UrlEncoded("cursor".into(), "abc".into()))
            .with_status(200)
            .with_body(second.to_string())
            .create_async()
            .await;

        let client = OpenAlexClient::new(&test_config(server.url()));
        let work = json!({ "id": "W1" });
        let citing = client.citing_works(&work, 500).await.unwrap();
        assert_eq!(citing.len(), 2);
        assert_eq!(citing[0].title.as_deref(), Some("Citing one"));
        assert_eq!(citing[1].title.as_deref(), Some("Citing two"));
    }

    #[tokio::test]
    async fn citing_works_respect_the_cap() {
        let mut server = Server::new_async().await;
        let page = json!({
            "results": [
                { "id": "https://openalex.org/W10", "title": "Citing one" },
                { "id": "https://openalex.org/W11", "title": "Citing two" }
            ],
            "meta": { "next_cursor": "next" }
        });
        let _mock = server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(page.to_string())
            .create_async()
            .await;

        let client = OpenAlexClient::new(&test_config(server.url()));
        let work = json!({ "id": "W1" });
        let citing = client.citing_works(&work, 1).await.unwrap();
        assert_eq!(citing.len(), 1);
    }

    #[tokio::test]
    async fn a_failed_reference_batch_degrades_to_partial_results() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = OpenAlexClient::new(&test_config(server.url()));
        let references = client.references(&work_fixture()).await.unwrap();
        assert!(references.is_empty());
    }
}
