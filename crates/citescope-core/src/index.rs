use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::identity::{PaperKey, resolve_key};
use crate::merge::merge_records;
use crate::models::{PaperRecord, SeedPaper};

/// Which relation list of a seed paper an index is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Outgoing references: candidate papers the seeds cite.
    References,
    /// Incoming citations: candidate papers that cite the seeds.
    CitedBy,
}

/// A contributing seed paper, by its own input identifier and a short
/// display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedRef {
    pub doi: String,
    pub title: String,
}

/// One candidate paper in a citation index: the first-seen metadata
/// snapshot and the distinct seed papers related to it.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub key: PaperKey,
    pub record: PaperRecord,
    seed_keys: Vec<PaperKey>,
    seed_refs: Vec<SeedRef>,
}

impl IndexEntry {
    /// Number of distinct seed papers contributing to this entry
    /// (`c_in`/`c_out` before thresholding).
    pub fn seed_count(&self) -> usize {
        self.seed_keys.len()
    }

    /// Contributing seed papers, in first-contribution order.
    pub fn seed_refs(&self) -> &[SeedRef] {
        &self.seed_refs
    }

    fn note_seed(&mut self, seed_key: &PaperKey, seed_ref: &SeedRef) {
        // One contribution per seed, however many times the seed's list
        // repeats this paper.
        if !self.seed_keys.contains(seed_key) {
            self.seed_keys.push(seed_key.clone());
            self.seed_refs.push(seed_ref.clone());
        }
    }
}

/// Insertion-ordered mapping from candidate key to index entry, built over
/// one relation direction across every usable seed paper. Iteration order
/// is first-seen order, so downstream output is reproducible run-to-run.
#[derive(Debug, Default)]
pub struct CitationIndex {
    slots: HashMap<PaperKey, usize>,
    entries: Vec<IndexEntry>,
}

impl CitationIndex {
    pub fn build(papers: &[SeedPaper], relation: Relation) -> Self {
        let mut index = Self::default();
        for paper in papers {
            let Some(metadata) = paper.metadata.as_ref() else {
                continue;
            };
            // A seed whose metadata yields no key has no identity to count
            // contributions under; its lists are skipped.
            let Some(seed_key) = resolve_key(metadata) else {
                continue;
            };
            let seed_ref = SeedRef {
                doi: paper.input_doi.clone(),
                title: paper.label(),
            };

            let list = match relation {
                Relation::References => &paper.references,
                Relation::CitedBy => &paper.cited_by,
            };
            for record in list {
                let Some(key) = resolve_key(record) else {
                    continue;
                };
                index.entry_mut(key, record).note_seed(&seed_key, &seed_ref);
            }
        }
        index
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &PaperKey) -> Option<&IndexEntry> {
        self.slots.get(key).map(|&slot| &self.entries[slot])
    }

    fn entry_mut(&mut self, key: PaperKey, record: &PaperRecord) -> &mut IndexEntry {
        let slot = match self.slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.entries.push(IndexEntry {
                    key: key.clone(),
                    // Only one raw record is known at this point; later
                    // occurrences under the same key keep this first
                    // snapshot.
                    record: merge_records(std::iter::once(record)),
                    seed_keys: Vec::new(),
                    seed_refs: Vec::new(),
                });
                self.slots.insert(key, slot);
                slot
            }
        };
        &mut self.entries[slot]
    }
}

/// Canonical keys of every seed paper in the document.
pub fn seed_key_set(papers: &[SeedPaper]) -> HashSet<PaperKey> {
    papers
        .iter()
        .filter_map(|paper| paper.metadata.as_ref())
        .filter_map(resolve_key)
        .collect()
}
