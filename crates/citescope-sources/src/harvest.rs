use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use citescope_core::{PaperKey, PaperRecord, SeedPaper, merge_into, resolve_key};

use crate::config::FetchConfig;
use crate::doi::normalize_doi;
use crate::openalex::{self, OpenAlexClient};
use crate::semantic_scholar::{self, SemanticScholarClient};

/// Per-DOI fetch pipeline: query both providers, merge their reference and
/// citing lists through the core's identity rules.
pub struct Harvester {
    openalex: OpenAlexClient,
    semantic_scholar: SemanticScholarClient,
    max_citing: usize,
}

impl Harvester {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            openalex: OpenAlexClient::new(config),
            semantic_scholar: SemanticScholarClient::new(config),
            max_citing: config.max_citing as usize,
        }
    }

    /// Process one input DOI end to end. Provider failures degrade to
    /// partial or empty lists; only a DOI that no provider knows marks the
    /// entry with an error.
    pub async fn harvest(&self, input_doi: &str) -> SeedPaper {
        let mut entry = SeedPaper {
            input_doi: input_doi.to_string(),
            ..Default::default()
        };

        let doi = match normalize_doi(input_doi) {
            Ok(doi) => doi,
            Err(e) => {
                warn!("skipping {input_doi}: {e}");
                entry.error = Some(e.to_string());
                return entry;
            }
        };

        let mut references = Vec::new();
        let mut cited_by = Vec::new();

        // OpenAlex first: its records are the richer of the two, so they
        // lead the merge order.
        match self.openalex.work_by_doi(&doi).await {
            Ok(Some(work)) => {
                entry.sources_used.push("openalex".to_string());
                entry.metadata = Some(openalex::record_from_work(&work));

                match self.openalex.references(&work).await {
                    Ok(records) => {
                        debug!("openalex: {} references for {doi}", records.len());
                        references.extend(records);
                    }
                    Err(e) => warn!("openalex references failed for {doi}: {e}"),
                }
                match self.openalex.citing_works(&work, self.max_citing).await {
                    Ok(records) => {
                        debug!("openalex: {} citing works for {doi}", records.len());
                        cited_by.extend(records);
                    }
                    Err(e) => warn!("openalex citing works failed for {doi}: {e}"),
                }
            }
            Ok(None) => info!("{doi} not found on openalex"),
            Err(e) => warn!("openalex lookup failed for {doi}: {e}"),
        }

        match self.semantic_scholar.paper_by_doi(&doi).await {
            Ok(Some(paper)) => {
                entry.sources_used.push("semantic_scholar".to_string());
                if entry.metadata.is_none() {
                    entry.metadata = Some(semantic_scholar::record_from_paper(&paper));
                }

                if let Some(paper_id) = paper.get("paperId").and_then(Value::as_str) {
                    match self.semantic_scholar.references(paper_id, self.max_citing).await {
                        Ok(records) => {
                            debug!("semantic scholar: {} references for {doi}", records.len());
                            references.extend(records);
                        }
                        Err(e) => warn!("semantic scholar references failed for {doi}: {e}"),
                    }
                    match self.semantic_scholar.citations(paper_id, self.max_citing).await {
                        Ok(records) => {
                            debug!("semantic scholar: {} citations for {doi}", records.len());
                            cited_by.extend(records);
                        }
                        Err(e) => warn!("semantic scholar citations failed for {doi}: {e}"),
                    }
                }
            }
            Ok(None) => info!("{doi} not found on semantic scholar"),
            Err(e) => warn!("semantic scholar lookup failed for {doi}: {e}"),
        }

        entry.references = merge_paper_lists(references);
        entry.cited_by = merge_paper_lists(cited_by);

        if entry.metadata.is_none() {
            entry.error = Some("paper not found in any source".to_string());
        }
        entry
    }

    /// Citing-works cap this harvester was configured with.
    pub fn max_citing(&self) -> u32 {
        self.max_citing as u32
    }
}

/// Collapse duplicates across providers: records resolving to the same key
/// merge first-wins in list order (so the source tag turns into the
/// combined marker when both providers contributed); records with no key
/// are kept as they are.
pub fn merge_paper_lists(records: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut slots: HashMap<PaperKey, usize> = HashMap::new();
    let mut merged: Vec<PaperRecord> = Vec::new();
    for record in records {
        match resolve_key(&record) {
            Some(key) => match slots.get(&key) {
                Some(&slot) => merge_into(&mut merged[slot], &record),
                None => {
                    slots.insert(key, merged.len());
                    merged.push(record);
                }
            },
            None => merged.push(record),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use citescope_core::SourceTag;

    use super::*;

    fn openalex_record(title: &str) -> PaperRecord {
        PaperRecord {
            title: Some(title.to_string()),
            openalex_id: Some("W1".to_string()),
            year: Some(2020),
            source: Some(SourceTag::OpenAlex),
            ..Default::default()
        }
    }

    fn s2_record(title: &str) -> PaperRecord {
        PaperRecord {
            title: Some(title.to_string()),
            s2_id: Some("p1".to_string()),
            venue: Some("arXiv.org".to_string()),
            source: Some(SourceTag::SemanticScholar),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_records_across_providers_merge_into_one() {
        let merged = merge_paper_lists(vec![
            openalex_record("Paper X"),
            s2_record("paper x"),
            s2_record("Paper Y"),
        ]);

        assert_eq!(merged.len(), 2);
        let x = &merged[0];
        assert_eq!(x.title.as_deref(), Some("Paper X"));
        assert_eq!(x.openalex_id.as_deref(), Some("W1"));
        assert_eq!(x.s2_id.as_deref(), Some("p1"));
        assert_eq!(x.venue.as_deref(), Some("arXiv.org"));
        assert_eq!(x.source, Some(SourceTag::Combined));

        assert_eq!(merged[1].source, Some(SourceTag::SemanticScholar));
    }

    #[test]
    fn first_provider_in_list_order_wins_conflicts() {
        let mut late = s2_record("Paper X");
        late.year = Some(1999);
        let merged = merge_paper_lists(vec![openalex_record("Paper X"), late]);
        assert_eq!(merged[0].year, Some(2020));
    }

    #[test]
    fn keyless_records_are_passed_through() {
        let merged = merge_paper_lists(vec![
            PaperRecord::default(),
            openalex_record("Paper X"),
            PaperRecord::default(),
        ]);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn empty_input_merges_to_nothing() {
        assert!(merge_paper_lists(Vec::new()).is_empty());
    }
}
