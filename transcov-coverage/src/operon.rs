//! Operon adjacency evidence.
//!
//! A read that starts inside one feature and ends inside another is evidence that
//! the two features are co-transcribed. Spanning reads are counted per upstream
//! feature so a downstream operon caller can score the adjacency.

use std::collections::BTreeMap;

use fxhash::FxHashMap as HashMap;
use serde::Serialize;

use transcov_core::models::{Feature, FeatureId, Strand};

///
/// Read-only lookup from genomic position to the features overlapping it.
///
pub trait FeatureAdjacencyIndex: Send + Sync {
    /// Ids of the features on `chromosome`/`strand` containing the 1-based
    /// `position`, sorted by id.
    fn features_at(&self, chromosome: &str, strand: Strand, position: u64) -> Vec<FeatureId>;

    fn feature(&self, id: FeatureId) -> Option<&Feature>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureAdjacencyCandidate {
    pub upstream: FeatureId,
    pub downstream: FeatureId,
    pub spanning_reads: u32,
}

/// Adjacency candidates keyed by upstream feature id.
pub type AdjacencyCandidates = BTreeMap<FeatureId, FeatureAdjacencyCandidate>;

///
/// Record a spanning read between the features at `start` and `stop`.
///
/// Every pairing of a feature at one end with a different feature at the other
/// end is considered. Pairs involving a miscellaneous RNA are ignored. The first
/// qualifying pair for an upstream feature creates its candidate; later pairs only
/// raise the spanning-read count.
///
/// Returns the number of candidates touched.
pub fn check_adjacency(
    candidates: &mut AdjacencyCandidates,
    index: &dyn FeatureAdjacencyIndex,
    chromosome: &str,
    strand: Strand,
    start: u64,
    stop: u64,
) -> usize {
    let at_start = index.features_at(chromosome, strand, start);
    if at_start.is_empty() {
        return 0;
    }
    let at_stop = index.features_at(chromosome, strand, stop);
    if at_stop.is_empty() {
        return 0;
    }

    // transcription runs start -> stop on the forward strand, stop -> start on the reverse
    let (upstream_ids, downstream_ids) = match strand {
        Strand::Forward => (&at_start, &at_stop),
        Strand::Reverse => (&at_stop, &at_start),
    };

    let mut touched = 0;
    for &upstream in upstream_ids {
        if !is_operon_eligible(index, upstream) {
            continue;
        }
        for &downstream in downstream_ids {
            if upstream == downstream || !is_operon_eligible(index, downstream) {
                continue;
            }
            candidates
                .entry(upstream)
                .and_modify(|candidate| candidate.spanning_reads += 1)
                .or_insert(FeatureAdjacencyCandidate {
                    upstream,
                    downstream,
                    spanning_reads: 1,
                });
            touched += 1;
        }
    }

    touched
}

fn is_operon_eligible(index: &dyn FeatureAdjacencyIndex, id: FeatureId) -> bool {
    index
        .feature(id)
        .is_some_and(|feature| !feature.feature_type.is_misc_rna())
}

/// Fold `other` into `into`, keeping the first-seen pairing for each upstream id.
pub fn merge_candidates(into: &mut AdjacencyCandidates, other: AdjacencyCandidates) {
    for (upstream, candidate) in other {
        into.entry(upstream)
            .and_modify(|existing| existing.spanning_reads += candidate.spanning_reads)
            .or_insert(candidate);
    }
}

/// Features of one chromosome strand, sorted by start for binary-search lookups.
#[derive(Debug, Clone, Default)]
struct StrandFeatures {
    /// (start, stop, id), sorted by start
    intervals: Vec<(u64, u64, FeatureId)>,
    max_len: u64,
}

impl StrandFeatures {
    fn build(mut intervals: Vec<(u64, u64, FeatureId)>) -> Self {
        intervals.sort();
        let max_len = intervals
            .iter()
            .map(|(start, stop, _)| stop.saturating_sub(*start) + 1)
            .max()
            .unwrap_or(0);
        StrandFeatures { intervals, max_len }
    }

    /// First index whose start could still contain `position`.
    fn lower_bound(&self, position: u64) -> usize {
        let floor = position.saturating_sub(self.max_len);
        self.intervals.partition_point(|(start, _, _)| *start < floor)
    }

    fn find(&self, position: u64) -> Vec<FeatureId> {
        let mut hits: Vec<FeatureId> = self.intervals[self.lower_bound(position)..]
            .iter()
            .take_while(|(start, _, _)| *start <= position)
            .filter(|(_, stop, _)| *stop >= position)
            .map(|(_, _, id)| *id)
            .collect();
        hits.sort_unstable();
        hits
    }
}

fn strand_slot(strand: Strand) -> usize {
    match strand {
        Strand::Forward => 0,
        Strand::Reverse => 1,
    }
}

///
/// In-memory [`FeatureAdjacencyIndex`] over a fixed feature annotation.
///
#[derive(Debug, Clone, Default)]
pub struct FeatureIntervals {
    features: HashMap<FeatureId, Feature>,
    by_chromosome: HashMap<String, [StrandFeatures; 2]>,
}

impl FeatureIntervals {
    pub fn build(features: Vec<Feature>) -> Self {
        let mut grouped: HashMap<String, [Vec<(u64, u64, FeatureId)>; 2]> = HashMap::default();
        let mut by_id: HashMap<FeatureId, Feature> = HashMap::default();

        for feature in features {
            grouped.entry(feature.chromosome.clone()).or_default()[strand_slot(feature.strand)]
                .push((feature.start, feature.stop, feature.id));
            by_id.insert(feature.id, feature);
        }

        let by_chromosome = grouped
            .into_iter()
            .map(|(chrom, [forward, reverse])| {
                (
                    chrom,
                    [StrandFeatures::build(forward), StrandFeatures::build(reverse)],
                )
            })
            .collect();

        FeatureIntervals {
            features: by_id,
            by_chromosome,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureAdjacencyIndex for FeatureIntervals {
    fn features_at(&self, chromosome: &str, strand: Strand, position: u64) -> Vec<FeatureId> {
        self.by_chromosome
            .get(chromosome)
            .map(|strands| strands[strand_slot(strand)].find(position))
            .unwrap_or_default()
    }

    fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use transcov_core::models::FeatureType;

    fn feature(id: u64, start: u64, stop: u64, strand: Strand, feature_type: FeatureType) -> Feature {
        Feature {
            id: FeatureId(id),
            chromosome: "chr1".to_string(),
            start,
            stop,
            strand,
            feature_type,
        }
    }

    #[fixture]
    fn index() -> FeatureIntervals {
        FeatureIntervals::build(vec![
            feature(1, 100, 200, Strand::Forward, FeatureType::Gene),
            feature(2, 210, 400, Strand::Forward, FeatureType::Gene),
            feature(3, 150, 260, Strand::Forward, FeatureType::MiscRna),
            feature(4, 100, 200, Strand::Reverse, FeatureType::Gene),
            feature(5, 210, 400, Strand::Reverse, FeatureType::Gene),
        ])
    }

    #[rstest]
    fn test_features_at_sorted_and_stranded(index: FeatureIntervals) {
        assert_eq!(
            index.features_at("chr1", Strand::Forward, 180),
            vec![FeatureId(1), FeatureId(3)]
        );
        assert_eq!(
            index.features_at("chr1", Strand::Reverse, 180),
            vec![FeatureId(4)]
        );
        assert!(index.features_at("chr1", Strand::Forward, 205).is_empty());
        assert!(index.features_at("chr2", Strand::Forward, 180).is_empty());
    }

    #[rstest]
    fn test_features_at_inclusive_bounds(index: FeatureIntervals) {
        assert_eq!(index.features_at("chr1", Strand::Forward, 100), vec![FeatureId(1)]);
        assert_eq!(
            index.features_at("chr1", Strand::Forward, 400),
            vec![FeatureId(2)]
        );
    }

    #[rstest]
    fn test_spanning_read_creates_then_increments(index: FeatureIntervals) {
        let mut candidates = AdjacencyCandidates::new();

        let touched = check_adjacency(&mut candidates, &index, "chr1", Strand::Forward, 120, 300);
        assert_eq!(touched, 1);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[&FeatureId(1)].downstream, FeatureId(2));
        assert_eq!(candidates[&FeatureId(1)].spanning_reads, 1);

        check_adjacency(&mut candidates, &index, "chr1", Strand::Forward, 110, 350);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[&FeatureId(1)].spanning_reads, 2);
    }

    #[rstest]
    fn test_misc_rna_and_self_pairs_are_ignored(index: FeatureIntervals) {
        let mut candidates = AdjacencyCandidates::new();

        // both ends in feature 1 (and misc RNA 3 at the stop)
        let touched = check_adjacency(&mut candidates, &index, "chr1", Strand::Forward, 110, 190);
        assert_eq!(touched, 0);
        assert!(candidates.is_empty());
    }

    #[rstest]
    fn test_reverse_strand_upstream_is_stop_side(index: FeatureIntervals) {
        let mut candidates = AdjacencyCandidates::new();

        check_adjacency(&mut candidates, &index, "chr1", Strand::Reverse, 150, 300);
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[&FeatureId(5)];
        assert_eq!(candidate.downstream, FeatureId(4));
    }

    #[rstest]
    fn test_merge_candidates_sums_counts() {
        let mut left = AdjacencyCandidates::new();
        left.insert(
            FeatureId(1),
            FeatureAdjacencyCandidate {
                upstream: FeatureId(1),
                downstream: FeatureId(2),
                spanning_reads: 2,
            },
        );
        let mut right = AdjacencyCandidates::new();
        right.insert(
            FeatureId(1),
            FeatureAdjacencyCandidate {
                upstream: FeatureId(1),
                downstream: FeatureId(9),
                spanning_reads: 3,
            },
        );

        merge_candidates(&mut left, right);
        assert_eq!(left[&FeatureId(1)].spanning_reads, 5);
        assert_eq!(left[&FeatureId(1)].downstream, FeatureId(2));
    }
}
