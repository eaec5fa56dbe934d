use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::PaperRecord;

/// Contributor labels are capped at this many characters (ellipsis
/// included).
const LABEL_MAX_CHARS: usize = 60;

/// Provenance block written by the fetcher; carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_dois: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_citing_per_paper: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// One seed entry: the paper's own metadata record plus its collected
/// relation lists.
///
/// `metadata` being absent means the fetcher found the paper nowhere; such
/// an entry contributes no seed key and its relation lists are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedPaper {
    pub input_doi: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PaperRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<PaperRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cited_by: Vec<PaperRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_used: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SeedPaper {
    /// Short display label used in contributor lists: the title, truncated
    /// with an ellipsis.
    pub fn label(&self) -> String {
        let title = self
            .metadata
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .unwrap_or("Unknown");
        if title.chars().count() > LABEL_MAX_CHARS {
            let head: String = title.chars().take(LABEL_MAX_CHARS - 3).collect();
            format!("{head}...")
        } else {
            title.to_string()
        }
    }
}

/// Fully materialized input for one analysis run, as produced by the
/// fetcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_info: Option<QueryInfo>,

    pub papers: Vec<SeedPaper>,
}

impl CitationDocument {
    /// Parse a document, failing closed on anything but the expected
    /// top-level shape; no per-record processing happens on failure.
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}
