use std::collections::HashSet;

use serde::Serialize;

use crate::identity::PaperKey;
use crate::index::{CitationIndex, IndexEntry, SeedRef};

/// A ranked candidate from the reference index: a paper outside the seed
/// set, cited by `c_in` distinct seed papers.
#[derive(Debug, Clone, Serialize)]
pub struct CitedEntry {
    pub key: PaperKey,
    pub doi: String,
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: String,
    pub c_in: usize,
    pub cited_by_seed_papers: Vec<SeedRef>,
    /// Always false by construction (seed keys are filtered out before
    /// ranking); kept for downstream consumers.
    pub is_in_seed_set: bool,
}

/// A ranked candidate from the citing index: a paper outside the seed set
/// that cites `c_out` distinct seed papers.
#[derive(Debug, Clone, Serialize)]
pub struct CitingEntry {
    pub key: PaperKey,
    pub doi: String,
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: String,
    pub c_out: usize,
    pub cites_seed_papers: Vec<SeedRef>,
    pub is_in_seed_set: bool,
}

/// Output document for the frequently-cited references (`R_k`).
#[derive(Debug, Serialize)]
pub struct CitedReport {
    pub description: String,
    pub k_cited: u32,
    pub count: usize,
    pub papers: Vec<CitedEntry>,
}

/// Output document for the frequently-citing papers (`Q_k'`).
#[derive(Debug, Serialize)]
pub struct CitingReport {
    pub description: String,
    pub k_citing: u32,
    pub count: usize,
    pub papers: Vec<CitingEntry>,
}

/// Rank the reference index: papers outside the seed set cited by at least
/// `k_cited` seed papers, most-cited first.
pub fn rank_cited(
    index: &CitationIndex,
    seed_keys: &HashSet<PaperKey>,
    k_cited: u32,
) -> CitedReport {
    let papers: Vec<CitedEntry> = ranked(index, seed_keys, k_cited)
        .into_iter()
        .map(|entry| CitedEntry {
            key: entry.key.clone(),
            doi: entry.record.doi.clone().unwrap_or_default(),
            arxiv_id: entry.record.arxiv_id.clone().unwrap_or_default(),
            title: entry.record.title.clone().unwrap_or_default(),
            authors: entry.record.authors.clone(),
            year: entry.record.year,
            venue: entry.record.venue.clone().unwrap_or_default(),
            c_in: entry.seed_count(),
            cited_by_seed_papers: entry.seed_refs().to_vec(),
            is_in_seed_set: false,
        })
        .collect();

    CitedReport {
        description: format!("Papers cited by at least {k_cited} papers from the seed set"),
        k_cited,
        count: papers.len(),
        papers,
    }
}

/// Rank the citing index: papers outside the seed set that cite at least
/// `k_citing` seed papers.
pub fn rank_citing(
    index: &CitationIndex,
    seed_keys: &HashSet<PaperKey>,
    k_citing: u32,
) -> CitingReport {
    let papers: Vec<CitingEntry> = ranked(index, seed_keys, k_citing)
        .into_iter()
        .map(|entry| CitingEntry {
            key: entry.key.clone(),
            doi: entry.record.doi.clone().unwrap_or_default(),
            arxiv_id: entry.record.arxiv_id.clone().unwrap_or_default(),
            title: entry.record.title.clone().unwrap_or_default(),
            authors: entry.record.authors.clone(),
            year: entry.record.year,
            venue: entry.record.venue.clone().unwrap_or_default(),
            c_out: entry.seed_count(),
            cites_seed_papers: entry.seed_refs().to_vec(),
            is_in_seed_set: false,
        })
        .collect();

    CitingReport {
        description: format!("Papers citing at least {k_citing} papers from the seed set"),
        k_citing,
        count: papers.len(),
        papers,
    }
}

/// Shared filter-and-sort pass: drop seed-set members, keep entries at or
/// above the threshold, order by contribution count descending with ties
/// broken by title ascending. The sort is stable, so entries tied on both
/// keep their index insertion order.
fn ranked<'a>(
    index: &'a CitationIndex,
    seed_keys: &HashSet<PaperKey>,
    threshold: u32,
) -> Vec<&'a IndexEntry> {
    let mut entries: Vec<&IndexEntry> = index
        .iter()
        .filter(|entry| !seed_keys.contains(&entry.key))
        .filter(|entry| entry.seed_count() >= threshold as usize)
        .collect();
    entries.sort_by(|a, b| {
        b.seed_count()
            .cmp(&a.seed_count())
            .then_with(|| title_of(a).cmp(title_of(b)))
    });
    entries
}

fn title_of(entry: &IndexEntry) -> &str {
    entry.record.title.as_deref().unwrap_or("")
}
