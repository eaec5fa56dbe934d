//! Citescope core — paper identity resolution and citation aggregation.
//!
//! Consumes a fully materialized citation document (seed papers with their
//! reference and citing lists, as collected by `citescope-sources`) and
//! computes, entirely in memory: canonical paper keys, merged metadata
//! records, per-relation citation indices, thresholded rankings, and the
//! node/edge graph handed to the renderer.

pub mod aggregate;
pub mod error;
pub mod graph;
pub mod identity;
pub mod index;
pub mod merge;
pub mod models;

pub use aggregate::{CitedEntry, CitedReport, CitingEntry, CitingReport, rank_cited, rank_citing};
pub use error::{Error, Result};
pub use graph::{CandidateNode, CitationGraph, EdgeRelation, GraphEdge, SeedNode};
pub use identity::{PaperKey, arxiv_id_from_doi, normalize_title, resolve_key};
pub use index::{CitationIndex, IndexEntry, Relation, SeedRef, seed_key_set};
pub use merge::{merge_into, merge_records};
pub use models::{CitationDocument, PaperRecord, QueryInfo, SeedPaper, SourceTag};

/// Run the full analysis over a parsed document: both citation indices,
/// thresholded and ranked into the cited (`R_k`) and citing (`Q_k'`)
/// reports.
pub fn analyze(document: &CitationDocument, k_cited: u32, k_citing: u32) -> (CitedReport, CitingReport) {
    let references = CitationIndex::build(&document.papers, Relation::References);
    let citing = CitationIndex::build(&document.papers, Relation::CitedBy);
    let seeds = seed_key_set(&document.papers);
    (
        rank_cited(&references, &seeds, k_cited),
        rank_citing(&citing, &seeds, k_citing),
    )
}

/// Build the renderable node/edge graph for a parsed document.
pub fn build_graph(document: &CitationDocument, k_cited: u32, k_citing: u32) -> CitationGraph {
    let references = CitationIndex::build(&document.papers, Relation::References);
    let citing = CitationIndex::build(&document.papers, Relation::CitedBy);
    CitationGraph::build(&document.papers, &references, &citing, k_cited, k_citing)
}
