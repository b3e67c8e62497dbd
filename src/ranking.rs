//! Deterministic ranking of hypothesis rows for a query.
//!
//! Rows are ordered by:
//! 1. normalized name distance to the query, ascending
//! 2. confidence, descending
//! 3. tie rank, ascending
//! 4. video id, ascending
//!
//! The tie rank resolves exact `(person_name, confidence, video_id)` duplicates
//! by shot id and is computed once when the table is built.

use crate::distance::DistanceScorer;
use crate::records::HypothesisRecord;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Hypothesis row with its load-time derived columns
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHypothesis {
    pub record: HypothesisRecord,
    /// Character count of the person name
    pub name_length: usize,
    /// Position under ascending shot id within its tie group
    pub tie_rank: usize,
}

/// Query-scoped values for one hypothesis row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryScratch {
    /// Index into the hypothesis table
    pub row: usize,
    pub distance: f64,
    pub relevant: bool,
}

/// Immutable hypothesis table shared by every query of a session
#[derive(Debug, Clone, Default)]
pub struct HypothesisTable {
    rows: Vec<RankedHypothesis>,
}

impl HypothesisTable {
    /// Build the table, precomputing name lengths and tie ranks
    #[must_use]
    pub fn new(records: Vec<HypothesisRecord>) -> Self {
        let tie_ranks = compute_tie_ranks(&records);

        let rows = records
            .into_iter()
            .zip(tie_ranks)
            .map(|(record, tie_rank)| RankedHypothesis {
                name_length: record.person_name.chars().count(),
                tie_rank,
                record,
            })
            .collect();

        Self { rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[RankedHypothesis] {
        &self.rows
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&RankedHypothesis> {
        self.rows.get(row)
    }

    /// Score every row against `query` and return them in rank order
    ///
    /// `is_relevant` flags rows matching one of the query's reference shots.
    /// A fresh scratch vector is built on every call.
    pub fn rank<F>(&self, query: &str, is_relevant: F) -> Vec<QueryScratch>
    where
        F: Fn(&HypothesisRecord) -> bool,
    {
        let scorer = DistanceScorer::new(query);

        let mut scratch: Vec<QueryScratch> = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, h)| QueryScratch {
                row,
                distance: scorer.distance(&h.record.person_name, h.name_length),
                relevant: is_relevant(&h.record),
            })
            .collect();

        // stable: rows equal on every key keep file order
        scratch.sort_by(|a, b| self.compare(a, b));
        scratch
    }

    fn compare(&self, a: &QueryScratch, b: &QueryScratch) -> Ordering {
        let ra = &self.rows[a.row];
        let rb = &self.rows[b.row];

        a.distance
            .total_cmp(&b.distance)
            .then_with(|| {
                confidence_key(rb.record.confidence)
                    .total_cmp(&confidence_key(ra.record.confidence))
            })
            .then_with(|| ra.tie_rank.cmp(&rb.tie_rank))
            .then_with(|| ra.record.video_id.cmp(&rb.record.video_id))
    }
}

/// Confidence as compared and grouped: `-0.0` equals `0.0`, NaN sorts last
#[allow(clippy::float_cmp)]
fn confidence_key(confidence: f32) -> f32 {
    if confidence.is_nan() {
        f32::NEG_INFINITY
    } else if confidence == 0.0 {
        0.0
    } else {
        confidence
    }
}

/// Tie rank of each record, aligned with the input order
///
/// Records are grouped on `(person_name, confidence, video_id)`; within a group
/// each record gets its position under ascending shot id. Singletons get 0.
#[must_use]
pub fn compute_tie_ranks(records: &[HypothesisRecord]) -> Vec<usize> {
    let mut groups: HashMap<(&str, u32, &str), Vec<usize>> = HashMap::new();
    for (idx, r) in records.iter().enumerate() {
        groups
            .entry((
                r.person_name.as_str(),
                confidence_key(r.confidence).to_bits(),
                r.video_id.as_str(),
            ))
            .or_default()
            .push(idx);
    }

    let mut ranks = vec![0; records.len()];
    for members in groups.into_values() {
        if members.len() < 2 {
            continue;
        }

        let mut ordered = members;
        ordered.sort_by(|&a, &b| records[a].shot_id.cmp(&records[b].shot_id));

        for (rank, idx) in ordered.into_iter().enumerate() {
            ranks[idx] = rank;
        }
    }

    ranks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hyp(video: &str, shot: &str, name: &str, confidence: f32) -> HypothesisRecord {
        HypothesisRecord {
            corpus_id: "C".to_string(),
            video_id: video.to_string(),
            shot_id: shot.to_string(),
            person_name: name.to_string(),
            confidence,
        }
    }

    fn shots_in_order(table: &HypothesisTable, ranked: &[QueryScratch]) -> Vec<String> {
        ranked
            .iter()
            .map(|s| table.get(s.row).unwrap().record.shot_id.clone())
            .collect()
    }

    // ==========================================================================
    // Tie Rank Tests
    // ==========================================================================

    #[test]
    fn test_tie_ranks_singletons_are_zero() {
        let records = vec![hyp("V", "1", "alice", 0.9), hyp("V", "2", "bob", 0.9)];
        assert_eq!(compute_tie_ranks(&records), vec![0, 0]);
    }

    #[test]
    fn test_tie_ranks_follow_shot_order() {
        let records = vec![
            hyp("V", "003", "alice", 0.5),
            hyp("V", "001", "alice", 0.5),
            hyp("V", "002", "alice", 0.5),
        ];
        assert_eq!(compute_tie_ranks(&records), vec![2, 0, 1]);
    }

    #[test]
    fn test_tie_ranks_group_by_video_and_confidence() {
        let records = vec![
            hyp("V1", "2", "alice", 0.5),
            hyp("V2", "1", "alice", 0.5),
            hyp("V1", "1", "alice", 0.4),
            hyp("V1", "1", "alice", 0.5),
        ];
        assert_eq!(compute_tie_ranks(&records), vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_table_precomputes_name_length() {
        let table = HypothesisTable::new(vec![hyp("V", "1", "hervé", 0.1)]);
        assert_eq!(table.rows()[0].name_length, 5);
    }

    // ==========================================================================
    // Ordering Tests
    // ==========================================================================

    #[test]
    fn test_rank_distance_first() {
        let table = HypothesisTable::new(vec![
            hyp("V", "1", "bob", 0.99),
            hyp("V", "2", "alice", 0.1),
            hyp("V", "3", "alicia", 0.5),
        ]);

        let ranked = table.rank("alice", |_| false);
        assert_eq!(shots_in_order(&table, &ranked), vec!["2", "3", "1"]);
        assert!(ranked[0].distance.abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_confidence_descending_on_equal_distance() {
        let table = HypothesisTable::new(vec![
            hyp("V", "1", "alice", 0.2),
            hyp("V", "2", "alice", 0.8),
            hyp("V", "3", "alice", 0.5),
        ]);

        let ranked = table.rank("alice", |_| false);
        assert_eq!(shots_in_order(&table, &ranked), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_rank_exact_duplicates_by_shot() {
        let table = HypothesisTable::new(vec![
            hyp("V", "9", "alice", 0.5),
            hyp("V", "4", "alice", 0.5),
            hyp("V", "7", "alice", 0.5),
        ]);

        let ranked = table.rank("alice", |_| false);
        assert_eq!(shots_in_order(&table, &ranked), vec!["4", "7", "9"]);
    }

    #[test]
    fn test_rank_video_breaks_remaining_ties() {
        // same name and confidence, distinct videos: all tie ranks are 0
        let table = HypothesisTable::new(vec![
            hyp("V3", "1", "alice", 0.5),
            hyp("V1", "2", "alice", 0.5),
            hyp("V2", "3", "alice", 0.5),
        ]);

        let ranked = table.rank("alice", |_| false);
        assert_eq!(shots_in_order(&table, &ranked), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_rank_tie_rank_before_video() {
        // V1/2 and V2/1 both have tie rank 0, V1/3 has tie rank 1
        let table = HypothesisTable::new(vec![
            hyp("V1", "3", "alice", 0.5),
            hyp("V2", "1", "alice", 0.5),
            hyp("V1", "2", "alice", 0.5),
        ]);

        let ranked = table.rank("alice", |_| false);
        let order: Vec<(&str, &str)> = ranked
            .iter()
            .map(|s| {
                let r = &table.get(s.row).unwrap().record;
                (r.video_id.as_str(), r.shot_id.as_str())
            })
            .collect();
        assert_eq!(order, vec![("V1", "2"), ("V2", "1"), ("V1", "3")]);
    }

    #[test]
    fn test_rank_nan_confidence_last() {
        let table = HypothesisTable::new(vec![
            hyp("V", "2", "alice", f32::NAN),
            hyp("V", "1", "alice", 0.1),
        ]);

        let ranked = table.rank("alice", |_| false);
        assert_eq!(shots_in_order(&table, &ranked), vec!["1", "2"]);
    }

    #[test]
    fn test_tie_ranks_negative_zero_groups_with_zero() {
        let records = vec![hyp("V", "2", "alice", -0.0), hyp("V", "1", "alice", 0.0)];
        assert_eq!(compute_tie_ranks(&records), vec![1, 0]);

        let table = HypothesisTable::new(records);
        let ranked = table.rank("alice", |_| false);
        assert_eq!(shots_in_order(&table, &ranked), vec!["1", "2"]);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let records = vec![
            hyp("V2", "5", "alice", 0.5),
            hyp("V1", "3", "alice", 0.5),
            hyp("V1", "1", "alice", 0.5),
            hyp("V2", "2", "alice", 0.5),
            hyp("V1", "2", "alicia", 0.5),
        ];
        let first = HypothesisTable::new(records.clone());
        let second = HypothesisTable::new(records);

        let a = shots_in_order(&first, &first.rank("alice", |_| false));
        let b = shots_in_order(&second, &second.rank("alice", |_| false));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rank_flags_relevance() {
        let table = HypothesisTable::new(vec![
            hyp("V", "1", "alice", 0.9),
            hyp("V", "2", "alice", 0.5),
        ]);

        let ranked = table.rank("alice", |r| r.shot_id == "2");
        let flags: Vec<bool> = ranked.iter().map(|s| s.relevant).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn test_rank_does_not_mutate_table() {
        let table = HypothesisTable::new(vec![hyp("V", "1", "alice", 0.9)]);
        let before = table.rows().to_vec();

        let _ = table.rank("bob", |_| true);
        let _ = table.rank("alice", |_| false);

        assert_eq!(table.rows(), before.as_slice());
    }
}
