use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::PaperRecord;

/// Normalized title keys are capped at this many characters; titles that
/// only differ beyond the cap collide by design.
const TITLE_KEY_MAX_CHARS: usize = 150;

/// Punctuation that routinely differs between providers' renditions of the
/// same title.
const TITLE_PUNCTUATION: &[char] = &[
    ':', '-', '\u{2013}', '\u{2014}', '\u{2018}', '\u{2019}', '\'', '\u{201C}', '\u{201D}', '"',
];

// DOIs minted for arXiv deposits look like 10.48550/arXiv.<id>.
static ARXIV_DOI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"10\.48550/arxiv\.(\d+\.\d+)").unwrap());

/// Canonical identity of a paper, namespaced by the field that produced it:
/// `title:`, `arxiv:`, `doi:`, `openalex:` or `s2:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperKey(String);

impl PaperKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn new(namespace: &str, id: &str) -> Self {
        Self(format!("{namespace}:{id}"))
    }
}

impl fmt::Display for PaperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a title for identity matching: lowercase, replace punctuation
/// that varies between versions with spaces, collapse whitespace, cap the
/// length.
///
/// Idempotent: normalizing an already-normalized title returns it
/// unchanged.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if TITLE_PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(TITLE_KEY_MAX_CHARS).collect();
    truncated.trim_end().to_string()
}

/// Recover an arXiv id from a DOI minted for an arXiv deposit, e.g.
/// `10.48550/arXiv.2201.05125` -> `2201.05125`.
pub fn arxiv_id_from_doi(doi: &str) -> Option<String> {
    let lowered = doi.to_lowercase();
    ARXIV_DOI.captures(&lowered).map(|caps| caps[1].to_string())
}

/// Derive the canonical key for a record.
///
/// Namespace priority, first usable value wins: normalized title, arXiv id
/// recovered from an arXiv DOI, explicit arXiv id, DOI, OpenAlex id,
/// Semantic Scholar id. The title leads so that a preprint and its
/// published version (different DOIs, same title) merge. A record exposing
/// none of these has no identity and returns `None`; it cannot take part in
/// counting or the graph.
pub fn resolve_key(record: &PaperRecord) -> Option<PaperKey> {
    if let Some(title) = record.title.as_deref() {
        let normalized = normalize_title(title);
        if !normalized.is_empty() {
            return Some(PaperKey::new("title", &normalized));
        }
    }

    let doi = record.doi.as_deref().map(str::trim).filter(|s| !s.is_empty());

    if let Some(arxiv) = doi.and_then(arxiv_id_from_doi) {
        return Some(PaperKey::new("arxiv", &arxiv));
    }

    if let Some(arxiv) = usable(&record.arxiv_id) {
        return Some(PaperKey::new("arxiv", &arxiv.to_lowercase()));
    }

    if let Some(doi) = doi {
        return Some(PaperKey::new("doi", &doi.to_lowercase()));
    }

    if let Some(id) = usable(&record.openalex_id) {
        return Some(PaperKey::new("openalex", &id.to_lowercase()));
    }

    if let Some(id) = usable(&record.s2_id) {
        return Some(PaperKey::new("s2", &id.to_lowercase()));
    }

    None
}

fn usable(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_title(title: &str) -> PaperRecord {
        PaperRecord {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn normalization_unifies_case_spacing_and_punctuation() {
        assert_eq!(
            normalize_title("Attention  Is\tAll You Need"),
            "attention is all you need"
        );
        assert_eq!(
            normalize_title("Attention: Is-All \u{201C}You\u{201D} Need"),
            "attention is all you need"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let long = format!("{} end", "word ".repeat(40));
        for title in ["Attention: Is All You Need", "  spaced   out  ", long.as_str()] {
            let once = normalize_title(title);
            assert_eq!(normalize_title(&once), once);
        }
    }

    #[test]
    fn normalization_caps_length() {
        let long = "a".repeat(200);
        assert_eq!(normalize_title(&long).chars().count(), 150);

        // Two titles that only differ past the cap collide by design.
        let a = format!("{}{}", "x".repeat(150), "tail one");
        let b = format!("{}{}", "x".repeat(150), "tail two");
        assert_eq!(normalize_title(&a), normalize_title(&b));
    }

    #[test]
    fn title_wins_over_every_identifier() {
        let record = PaperRecord {
            title: Some("Paper A".to_string()),
            doi: Some("10.1/xyz".to_string()),
            arxiv_id: Some("2201.05125".to_string()),
            openalex_id: Some("W123".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_key(&record).unwrap().as_str(), "title:paper a");
    }

    #[test]
    fn arxiv_doi_resolves_to_arxiv_namespace() {
        assert_eq!(
            arxiv_id_from_doi("10.48550/arXiv.2201.05125").as_deref(),
            Some("2201.05125")
        );
        assert_eq!(arxiv_id_from_doi("10.1038/nature14539"), None);

        let record = PaperRecord {
            doi: Some("10.48550/arXiv.2201.05125".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_key(&record).unwrap().as_str(), "arxiv:2201.05125");
    }

    #[test]
    fn identifier_fallback_order() {
        let record = PaperRecord {
            arxiv_id: Some("2201.05125v2".to_string()),
            doi: Some("10.1/XYZ".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_key(&record).unwrap().as_str(), "arxiv:2201.05125v2");

        let record = PaperRecord {
            doi: Some("10.1/XYZ".to_string()),
            openalex_id: Some("W123".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_key(&record).unwrap().as_str(), "doi:10.1/xyz");
    }

    #[test]
    fn provider_id_keys_are_unstable_across_enrichment() {
        // The same logical paper first seen with only an OpenAlex id, then
        // later with a DOI, yields two different keys: expected behavior,
        // only title normalization unifies records across namespaces.
        let sparse = PaperRecord {
            openalex_id: Some("W123".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_key(&sparse).unwrap().as_str(), "openalex:w123");

        let enriched = PaperRecord {
            openalex_id: Some("W123".to_string()),
            doi: Some("10.1/xyz".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_key(&enriched).unwrap().as_str(), "doi:10.1/xyz");
    }

    #[test]
    fn degenerate_records_have_no_key() {
        assert_eq!(resolve_key(&PaperRecord::default()), None);
        assert_eq!(resolve_key(&record_with_title("  :- ")), None);

        let whitespace_ids = PaperRecord {
            doi: Some("   ".to_string()),
            s2_id: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_key(&whitespace_ids), None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let record = record_with_title("Determinism — A \u{2018}Case\u{2019} Study");
        assert_eq!(resolve_key(&record), resolve_key(&record.clone()));
    }
}
