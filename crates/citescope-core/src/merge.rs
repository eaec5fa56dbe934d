use crate::models::PaperRecord;

/// Merge an ordered group of records that resolved to the same key into one
/// canonical record.
///
/// Every field keeps the first non-empty value in traversal order and is
/// never overwritten, so when records disagree the result depends on the
/// caller's ordering; callers must not rely on that for conflict
/// resolution. Input records are left untouched.
pub fn merge_records<'a, I>(group: I) -> PaperRecord
where
    I: IntoIterator<Item = &'a PaperRecord>,
{
    let mut merged = PaperRecord::default();
    for record in group {
        merge_into(&mut merged, record);
    }
    merged
}

/// Fold one record into an accumulating canonical record, first-wins per
/// field. The source tag collapses to the combined marker as soon as two
/// distinct providers contribute.
pub fn merge_into(target: &mut PaperRecord, incoming: &PaperRecord) {
    merge_option(&mut target.title, &incoming.title);
    merge_option(&mut target.doi, &incoming.doi);
    merge_option(&mut target.arxiv_id, &incoming.arxiv_id);
    merge_option(&mut target.openalex_id, &incoming.openalex_id);
    merge_option(&mut target.s2_id, &incoming.s2_id);
    if target.authors.is_empty() {
        target.authors = incoming.authors.clone();
    }
    if target.year.is_none() {
        target.year = incoming.year;
    }
    merge_option(&mut target.venue, &incoming.venue);
    merge_option(&mut target.work_type, &incoming.work_type);
    if target.cited_by_count.is_none() {
        target.cited_by_count = incoming.cited_by_count;
    }
    target.source = match (target.source, incoming.source) {
        (Some(ours), Some(theirs)) => Some(ours.combine(theirs)),
        (None, theirs) => theirs,
        (ours, None) => ours,
    };
}

fn merge_option(target: &mut Option<String>, incoming: &Option<String>) {
    if target.is_none()
        && let Some(value) = incoming.as_deref().map(str::trim).filter(|s| !s.is_empty())
    {
        *target = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use crate::models::SourceTag;

    use super::*;

    fn openalex_record() -> PaperRecord {
        PaperRecord {
            title: Some("Scaling Laws for Neural Language Models".to_string()),
            openalex_id: Some("W3098121394".to_string()),
            year: Some(2020),
            source: Some(SourceTag::OpenAlex),
            ..Default::default()
        }
    }

    fn s2_record() -> PaperRecord {
        PaperRecord {
            title: Some("Scaling laws for neural language models".to_string()),
            s2_id: Some("e6c561d02500b2596a230b341a8eb8b921ca5bf2".to_string()),
            venue: Some("arXiv.org".to_string()),
            source: Some(SourceTag::SemanticScholar),
            ..Default::default()
        }
    }

    #[test]
    fn complementary_fields_fill_in() {
        // One record missing venue, the other missing year: the merge has
        // both.
        let merged = merge_records([&openalex_record(), &s2_record()]);
        assert_eq!(merged.year, Some(2020));
        assert_eq!(merged.venue.as_deref(), Some("arXiv.org"));
        assert_eq!(merged.openalex_id.as_deref(), Some("W3098121394"));
        assert!(merged.s2_id.is_some());
    }

    #[test]
    fn first_value_is_never_overwritten() {
        let merged = merge_records([&openalex_record(), &s2_record()]);
        assert_eq!(
            merged.title.as_deref(),
            Some("Scaling Laws for Neural Language Models")
        );

        let reversed = merge_records([&s2_record(), &openalex_record()]);
        assert_eq!(
            reversed.title.as_deref(),
            Some("Scaling laws for neural language models")
        );
    }

    #[test]
    fn merge_is_deterministic_for_a_fixed_order() {
        let group = [openalex_record(), s2_record()];
        let a = merge_records(group.iter());
        let b = merge_records(group.iter());
        assert_eq!(a, b);
    }

    #[test]
    fn source_tag_combines_across_providers() {
        let merged = merge_records([&openalex_record(), &s2_record()]);
        assert_eq!(merged.source, Some(SourceTag::Combined));

        let same_provider = merge_records([&openalex_record(), &openalex_record()]);
        assert_eq!(same_provider.source, Some(SourceTag::OpenAlex));
    }

    #[test]
    fn untagged_records_do_not_force_the_combined_marker() {
        let untagged = PaperRecord {
            title: Some("Untagged".to_string()),
            ..Default::default()
        };
        let merged = merge_records([&untagged, &openalex_record()]);
        assert_eq!(merged.source, Some(SourceTag::OpenAlex));
    }

    #[test]
    fn whitespace_values_count_as_absent() {
        let blank_venue = PaperRecord {
            venue: Some("   ".to_string()),
            ..Default::default()
        };
        let merged = merge_records([&blank_venue, &s2_record()]);
        assert_eq!(merged.venue.as_deref(), Some("arXiv.org"));
    }

    #[test]
    fn empty_group_merges_to_the_default_record() {
        let merged = merge_records(std::iter::empty::<&PaperRecord>());
        assert!(merged.is_empty());
    }
}
