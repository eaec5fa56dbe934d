use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::warn;

use citescope_core::{PaperRecord, SourceTag, arxiv_id_from_doi};

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::http::{DiskCache, RateLimitedClient};

const PAPER_FIELDS: &str = "paperId,externalIds,title,authors,year,venue,citationCount,referenceCount";
const RELATION_FIELDS: &str = "paperId,externalIds,title,authors,year,venue,citationCount";
const PAGE_LIMIT: usize = 100;
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

pub struct SemanticScholarClient {
    client: RateLimitedClient,
    cache: DiskCache,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            client: RateLimitedClient::new(
                config.request_interval(),
                config.max_retries,
                &config.user_agent(),
            ),
            cache: DiskCache::new("semantic_scholar", config.cache_ttl()),
            base_url: config
                .semantic_scholar_base_url
                .trim_end_matches('/')
                .to_string(),
            api_key: config.semantic_scholar_api_key.clone(),
        }
    }

    /// Fetch a paper by DOI, or by arXiv id when the DOI is an arXiv DOI
    /// (preprint coverage is better that way). `Ok(None)` when the paper is
    /// unknown.
    pub async fn paper_by_doi(&self, doi: &str) -> Result<Option<Value>> {
        let id = match arxiv_id_from_doi(doi) {
            Some(arxiv) => format!("ArXiv:{arxiv}"),
            None => format!("DOI:{doi}"),
        };

        let cache_key = format!("paper:{id}");
        if let Some(cached) = self.cache.get::<Value>(&cache_key).await {
            return Ok(Some(cached));
        }

        let url = format!("{}/paper/{}?fields={}", self.base_url, id, PAPER_FIELDS);
        let body = match self
            .client
            .get_with_headers(&url, self.auth_headers()?)
            .await
        {
            Ok(body) => body,
            Err(FetchError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let paper: Value =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        self.cache.set(&cache_key, &paper).await;
        Ok(Some(paper))
    }

    /// Papers this paper cites, paginated, capped at `max_results`.
    pub async fn references(&self, paper_id: &str, max_results: usize) -> Result<Vec<PaperRecord>> {
        self.relation_list(paper_id, "references", max_results).await
    }

    /// Papers citing this paper, paginated, capped at `max_results`.
    pub async fn citations(&self, paper_id: &str, max_results: usize) -> Result<Vec<PaperRecord>> {
        self.relation_list(paper_id, "citations", max_results).await
    }

    async fn relation_list(
        &self,
        paper_id: &str,
        relation: &str,
        max_results: usize,
    ) -> Result<Vec<PaperRecord>> {
        let mut records = Vec::new();
        let mut offset = 0usize;
        while records.len() < max_results {
            let url = format!(
                "{}/paper/{}/{}?fields={}&offset={}&limit={}",
                self.base_url, paper_id, relation, RELATION_FIELDS, offset, PAGE_LIMIT
            );
            let page: Value = match self
                .client
                .get_json_with_headers(&url, self.auth_headers()?)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!("failed to fetch Semantic Scholar {relation}: {e}");
                    break;
                }
            };
            let Some(batch) = page.get("data").and_then(Value::as_array) else {
                break;
            };
            if batch.is_empty() {
                break;
            }
            records.extend(
                batch
                    .iter()
                    .map(record_from_paper)
                    .filter(|record| !is_blank(record)),
            );
            offset += PAGE_LIMIT;
        }

        records.truncate(max_results);
        Ok(records)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value =
                HeaderValue::from_str(key).map_err(|e| FetchError::Parse(e.to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }
}

/// Map a Semantic Scholar paper payload to a metadata record, unwrapping
/// the `citingPaper`/`citedPaper` envelope the relation endpoints use.
pub fn record_from_paper(value: &Value) -> PaperRecord {
    let paper = value
        .get("citingPaper")
        .or_else(|| value.get("citedPaper"))
        .unwrap_or(value);

    let authors = paper
        .get("authors")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|author| author.get("name").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    PaperRecord {
        s2_id: non_empty(paper.get("paperId")),
        doi: non_empty(paper.pointer("/externalIds/DOI")),
        arxiv_id: non_empty(paper.pointer("/externalIds/ArXiv")),
        title: non_empty(paper.get("title")),
        authors,
        year: paper
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok()),
        venue: non_empty(paper.get("venue")),
        cited_by_count: paper.get("citationCount").and_then(Value::as_u64),
        source: Some(SourceTag::SemanticScholar),
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

// A relation entry whose payload carried nothing beyond the provider tag;
// the relation endpoints emit these for withdrawn or unmatched papers.
fn is_blank(record: &PaperRecord) -> bool {
    record.s2_id.is_none()
        && record.doi.is_none()
        && record.arxiv_id.is_none()
        && record.title.is_none()
        && record.authors.is_empty()
        && record.year.is_none()
}
