use std::collections::HashSet;

use serde::Serialize;

use crate::identity::{PaperKey, resolve_key};
use crate::index::{CitationIndex, IndexEntry};
use crate::models::SeedPaper;

/// Relation tag carried by every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeRelation {
    #[serde(rename = "cites")]
    Cites,
}

/// Directed `source cites target` edge; serializes as a
/// `[source, target, "cites"]` triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge(pub PaperKey, pub PaperKey, pub EdgeRelation);

impl GraphEdge {
    pub fn source(&self) -> &PaperKey {
        &self.0
    }

    pub fn target(&self) -> &PaperKey {
        &self.1
    }
}

/// A seed-partition node, carrying the seed's own metadata and input DOI.
#[derive(Debug, Clone, Serialize)]
pub struct SeedNode {
    pub key: PaperKey,
    pub doi: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: String,
}

/// A node from one of the thresholded candidate partitions; `count` is the
/// entry's distinct-seed contribution count.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateNode {
    pub key: PaperKey,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: String,
    pub count: usize,
}

/// Renderer-agnostic graph: three disjoint node partitions plus a
/// deduplicated, endpoint-filtered edge list.
#[derive(Debug, Default, Serialize)]
pub struct CitationGraph {
    pub seed_papers: Vec<SeedNode>,
    pub cited_papers: Vec<CandidateNode>,
    pub citing_papers: Vec<CandidateNode>,
    pub edges: Vec<GraphEdge>,
}

impl CitationGraph {
    /// Assemble the graph from the two citation indices.
    ///
    /// Partitions are disjoint with priority seed > cited > citing: a key
    /// that qualifies for a later partition but is already placed keeps its
    /// first placement. Edges are kept only when both endpoints are placed,
    /// and a repeated `(source, target)` pair collapses to one edge in
    /// first-occurrence order.
    pub fn build(
        papers: &[SeedPaper],
        reference_index: &CitationIndex,
        citing_index: &CitationIndex,
        k_cited: u32,
        k_citing: u32,
    ) -> Self {
        let mut graph = Self::default();
        let mut placed: HashSet<PaperKey> = HashSet::new();

        // One node per distinct seed key; the first entry's metadata wins.
        for paper in papers {
            let Some(metadata) = paper.metadata.as_ref() else {
                continue;
            };
            let Some(key) = resolve_key(metadata) else {
                continue;
            };
            if !placed.insert(key.clone()) {
                continue;
            }
            graph.seed_papers.push(SeedNode {
                key,
                doi: paper.input_doi.clone(),
                title: metadata
                    .title
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                authors: metadata.authors.clone(),
                year: metadata.year,
                venue: metadata.venue.clone().unwrap_or_default(),
            });
        }

        for entry in reference_index.iter() {
            if entry.seed_count() >= k_cited as usize && !placed.contains(&entry.key) {
                placed.insert(entry.key.clone());
                graph.cited_papers.push(candidate_node(entry));
            }
        }

        for entry in citing_index.iter() {
            if entry.seed_count() >= k_citing as usize && !placed.contains(&entry.key) {
                placed.insert(entry.key.clone());
                graph.citing_papers.push(candidate_node(entry));
            }
        }

        // `placed` is now the union of all three partitions.
        let mut seen: HashSet<(PaperKey, PaperKey)> = HashSet::new();
        for paper in papers {
            let Some(metadata) = paper.metadata.as_ref() else {
                continue;
            };
            let Some(seed_key) = resolve_key(metadata) else {
                continue;
            };
            for record in &paper.references {
                let Some(target) = resolve_key(record) else {
                    continue;
                };
                push_edge(&mut graph.edges, &mut seen, &placed, seed_key.clone(), target);
            }
            for record in &paper.cited_by {
                let Some(source) = resolve_key(record) else {
                    continue;
                };
                push_edge(&mut graph.edges, &mut seen, &placed, source, seed_key.clone());
            }
        }

        graph
    }

    pub fn node_count(&self) -> usize {
        self.seed_papers.len() + self.cited_papers.len() + self.citing_papers.len()
    }
}

fn candidate_node(entry: &IndexEntry) -> CandidateNode {
    CandidateNode {
        key: entry.key.clone(),
        title: entry
            .record
            .title
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        authors: entry.record.authors.clone(),
        year: entry.record.year,
        venue: entry.record.venue.clone().unwrap_or_default(),
        count: entry.seed_count(),
    }
}

fn push_edge(
    edges: &mut Vec<GraphEdge>,
    seen: &mut HashSet<(PaperKey, PaperKey)>,
    node_keys: &HashSet<PaperKey>,
    source: PaperKey,
    target: PaperKey,
) {
    if !node_keys.contains(&source) || !node_keys.contains(&target) {
        return;
    }
    if seen.insert((source.clone(), target.clone())) {
        edges.push(GraphEdge(source, target, EdgeRelation::Cites));
    }
}
