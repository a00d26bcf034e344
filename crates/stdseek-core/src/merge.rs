//! Merge, dedup and rank records coming back from several sources.
//!
//! Batches are merged in priority order: the first batch belongs to the
//! highest-priority source. Two records with the same normalized id become
//! one, with `contributing_sources` unioned and conflicts resolved in
//! favor of the higher-priority source's non-empty values.

use std::collections::HashMap;

use crate::models::{Availability, StandardRecord, Status};
use crate::normalize::normalize_identifier;

/// Drop records that cannot carry a merge key.
///
/// A record with an empty `id` is re-derived from its raw identifier;
/// if that is still empty the record is dropped and the reason logged.
pub fn sanitize_batch(source_name: &str, records: Vec<StandardRecord>) -> Vec<StandardRecord> {
    records
        .into_iter()
        .filter_map(|mut r| {
            if r.id.is_empty() {
                r.id = normalize_identifier(&r.raw_identifier);
            }
            if r.id.is_empty() {
                tracing::warn!(
                    source = source_name,
                    raw_identifier = %r.raw_identifier,
                    title = %r.title,
                    "dropping record: identifier normalizes to empty"
                );
                return None;
            }
            if r.contributing_sources.is_empty() {
                r.contributing_sources.insert(source_name.to_string());
            }
            Some(r)
        })
        .collect()
}

/// Merge batches listed in priority order. Output keeps first-seen order.
pub fn merge_records(batches: Vec<Vec<StandardRecord>>) -> Vec<StandardRecord> {
    let mut merged: Vec<StandardRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for batch in batches {
        for record in batch {
            if record.id.is_empty() {
                continue;
            }
            match index.get(&record.id) {
                Some(&pos) => absorb(&mut merged[pos], record),
                None => {
                    index.insert(record.id.clone(), merged.len());
                    merged.push(record);
                }
            }
        }
    }
    merged
}

/// Fold a lower-priority duplicate into `kept`.
fn absorb(kept: &mut StandardRecord, other: StandardRecord) {
    kept.contributing_sources.extend(other.contributing_sources);

    if kept.title.trim().is_empty() && !other.title.trim().is_empty() {
        kept.title = other.title;
    }
    if kept.status == Status::Unknown {
        kept.status = other.status;
    }
    if kept.publish_date.is_none() {
        kept.publish_date = other.publish_date;
    }
    if kept.effective_date.is_none() {
        kept.effective_date = other.effective_date;
    }
    kept.has_document = combine_availability(kept.has_document, other.has_document);

    for (source, fields) in other.source_metadata {
        let slot = kept.source_metadata.entry(source).or_default();
        for (k, v) in fields {
            slot.entry(k).or_insert(v);
        }
    }
}

/// A document is available if any contributing source can produce it.
pub fn combine_availability(a: Availability, b: Availability) -> Availability {
    use Availability::*;
    match (a, b) {
        (Available, _) | (_, Available) => Available,
        (Undetermined, _) | (_, Undetermined) => Undetermined,
        (Unavailable, Unavailable) => Unavailable,
    }
}

/// Stable rank: exact identifier matches first, then identifiers starting
/// with the keyword, then everything else in incoming order.
pub fn rank_records(records: &mut [StandardRecord], keyword: &str) {
    let wanted = normalize_identifier(keyword);
    if wanted.is_empty() {
        return;
    }
    records.sort_by_key(|r| {
        if r.id == wanted {
            0
        } else if r.id.starts_with(&wanted) {
            1
        } else {
            2
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(source: &str, raw: &str) -> StandardRecord {
        StandardRecord::new(source, raw)
    }

    #[test]
    fn test_merge_unions_contributing_sources() {
        let a = vec![rec("gbw", "GB/T 1234-2020").with_title("Widgets")];
        let b = vec![rec("zby", "gbt12342020")];
        let merged = merge_records(vec![a, b]);
        assert_eq!(merged.len(), 1);
        let sources: Vec<_> = merged[0].contributing_sources.iter().cloned().collect();
        assert_eq!(sources, vec!["gbw", "zby"]);
        assert_eq!(merged[0].raw_identifier, "GB/T 1234-2020");
    }

    #[test]
    fn test_merge_prefers_higher_priority_non_empty() {
        let high = rec("zby", "GB 1-2020").with_status(Status::Unknown);
        let low = rec("gbw", "GB 1-2020")
            .with_title("Low title")
            .with_status(Status::Current);
        let high2 = high.clone().with_title("High title");

        let merged = merge_records(vec![vec![high], vec![low.clone()]]);
        assert_eq!(merged[0].title, "Low title");
        assert_eq!(merged[0].status, Status::Current);

        let merged = merge_records(vec![vec![high2], vec![low]]);
        assert_eq!(merged[0].title, "High title");
    }

    #[test]
    fn test_merge_keeps_metadata_of_each_source() {
        let a = rec("gbw", "GB 1-2020").with_meta("gbw", "id", "abc");
        let b = rec("zby", "GB 1-2020").with_meta("zby", "standard_id", 7);
        let merged = merge_records(vec![vec![a], vec![b]]);
        assert_eq!(merged[0].meta_str("gbw", "id").as_deref(), Some("abc"));
        assert_eq!(merged[0].meta_str("zby", "standard_id").as_deref(), Some("7"));
    }

    #[test]
    fn test_sanitize_drops_empty_ids() {
        let mut blank = rec("by", " - ");
        blank.id.clear();
        let kept = sanitize_batch("by", vec![blank, rec("by", "QB/T 1-2000")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "qbt12000");
    }

    #[test]
    fn test_availability_combination() {
        use Availability::*;
        assert_eq!(combine_availability(Unavailable, Available), Available);
        assert_eq!(combine_availability(Unavailable, Undetermined), Undetermined);
        assert_eq!(combine_availability(Unavailable, Unavailable), Unavailable);
    }

    #[test]
    fn test_rank_exact_first_and_stable() {
        let mut records = vec![
            rec("gbw", "GB/T 3324-2017"),
            rec("gbw", "GB/T 33241-2018"),
            rec("gbw", "GB/T 3324-2024"),
            rec("gbw", "QB/T 3324"),
        ];
        rank_records(&mut records, "GB/T 3324-2024");
        assert_eq!(records[0].raw_identifier, "GB/T 3324-2024");
        assert_eq!(records[1].raw_identifier, "GB/T 3324-2017");
        assert_eq!(records[3].raw_identifier, "QB/T 3324");
    }
}
