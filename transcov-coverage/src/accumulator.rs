use log::debug;
use serde::Serialize;

use transcov_core::models::{MappingRecord, Strand};

use crate::errors::CoverageError;
use crate::operon::{AdjacencyCandidates, FeatureAdjacencyIndex, check_adjacency};
use crate::profile::CoverageProfile;

/// A region whose reads are left out of the unique-read statistics (e.g. rRNA, tRNA).
/// 1-based, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedRegion {
    pub chromosome: String,
    pub start: u64,
    pub stop: u64,
}

///
/// Per-position exclusion flags for one chromosome.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionMask {
    excluded: Vec<bool>,
}

impl ExclusionMask {
    pub fn new(length: u64) -> Self {
        ExclusionMask {
            excluded: vec![false; length as usize],
        }
    }

    /// Build the mask for `chromosome` from the regions lying on it; `None` if there are none.
    pub fn from_regions(chromosome: &str, length: u64, regions: &[ExcludedRegion]) -> Option<Self> {
        let mut on_chromosome = regions.iter().filter(|r| r.chromosome == chromosome).peekable();
        on_chromosome.peek()?;

        let mut mask = ExclusionMask::new(length);
        for region in on_chromosome {
            mask.exclude(region.start, region.stop);
        }
        Some(mask)
    }

    pub fn exclude(&mut self, start: u64, stop: u64) {
        let lo = start.max(1) as usize - 1;
        let hi = (stop as usize).min(self.excluded.len());
        if lo < hi {
            self.excluded[lo..hi].iter_mut().for_each(|flag| *flag = true);
        }
    }

    pub fn is_excluded(&self, position: u64) -> bool {
        position
            .checked_sub(1)
            .and_then(|index| self.excluded.get(index as usize))
            .copied()
            .unwrap_or(false)
    }
}

/// Running read statistics of an accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CoverageSummary {
    /// Every mapping accumulated.
    pub mappings: u64,
    /// Mappings whose ends avoid all excluded positions.
    pub unique_count: u64,
    /// Bases covered by the unique mappings.
    pub bases_total: u64,
}

impl CoverageSummary {
    pub fn mean_mapping_length(&self) -> f64 {
        if self.unique_count == 0 {
            return 0.0;
        }
        self.bases_total as f64 / self.unique_count as f64
    }

    pub fn merge(&mut self, other: &CoverageSummary) {
        self.mappings += other.mappings;
        self.unique_count += other.unique_count;
        self.bases_total += other.bases_total;
    }
}

///
/// Builds the coverage profile and operon adjacency evidence of one chromosome
/// from batches of mappings.
///
/// Batches may arrive in any number and any order; each batch is sorted by start
/// (stably) before it is applied. The accumulator keeps no reference to a batch
/// once it has been processed.
///
pub struct CoverageAccumulator<'a> {
    profile: CoverageProfile,
    exclusions: Option<ExclusionMask>,
    features: Option<&'a dyn FeatureAdjacencyIndex>,
    candidates: AdjacencyCandidates,
    summary: CoverageSummary,
}

impl<'a> CoverageAccumulator<'a> {
    pub fn new(chromosome: impl Into<String>, length: u64) -> Self {
        CoverageAccumulator {
            profile: CoverageProfile::new(chromosome, length),
            exclusions: None,
            features: None,
            candidates: AdjacencyCandidates::new(),
            summary: CoverageSummary::default(),
        }
    }

    pub fn with_features(mut self, features: &'a dyn FeatureAdjacencyIndex) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_exclusions(mut self, mask: ExclusionMask) -> Self {
        self.exclusions = Some(mask);
        self
    }

    pub fn chromosome(&self) -> &str {
        &self.profile.chromosome
    }

    pub fn profile(&self) -> &CoverageProfile {
        &self.profile
    }

    pub fn candidates(&self) -> &AdjacencyCandidates {
        &self.candidates
    }

    pub fn summary(&self) -> &CoverageSummary {
        &self.summary
    }

    ///
    /// Apply one batch of mappings for `chromosome`.
    ///
    /// The whole batch is checked before any count changes, so a rejected batch
    /// leaves the profile untouched.
    ///
    pub fn accumulate(
        &mut self,
        mut mappings: Vec<MappingRecord>,
        chromosome: &str,
    ) -> Result<(), CoverageError> {
        self.profile.ensure_live()?;
        if chromosome != self.profile.chromosome {
            return Err(CoverageError::ChromosomeMismatch {
                expected: self.profile.chromosome.clone(),
                found: chromosome.to_string(),
            });
        }
        for mapping in &mappings {
            self.validate(mapping)?;
        }

        mappings.sort_by_key(|mapping| mapping.start);

        for mapping in &mappings {
            self.apply(mapping);
        }

        debug!(
            "accumulated {} mappings on {} ({} unique so far)",
            mappings.len(),
            self.profile.chromosome,
            self.summary.unique_count
        );
        Ok(())
    }

    fn validate(&self, mapping: &MappingRecord) -> Result<(), CoverageError> {
        if mapping.chromosome != self.profile.chromosome {
            return Err(CoverageError::ChromosomeMismatch {
                expected: self.profile.chromosome.clone(),
                found: mapping.chromosome.clone(),
            });
        }
        if mapping.stop < mapping.start {
            return Err(CoverageError::MalformedMapping {
                chromosome: mapping.chromosome.clone(),
                start: mapping.start,
                stop: mapping.stop,
            });
        }
        if mapping.start == 0 || mapping.stop > self.profile.length {
            return Err(CoverageError::MappingOutOfBounds {
                chromosome: mapping.chromosome.clone(),
                start: mapping.start,
                stop: mapping.stop,
                length: self.profile.length,
            });
        }
        Ok(())
    }

    fn apply(&mut self, mapping: &MappingRecord) {
        let start = mapping.start;
        // a stop on the last base is pulled back by one
        let stop = if mapping.stop == self.profile.length && mapping.stop > start {
            mapping.stop - 1
        } else {
            mapping.stop
        };

        self.summary.mappings += 1;
        let excluded = self
            .exclusions
            .as_ref()
            .is_some_and(|mask| mask.is_excluded(start) || mask.is_excluded(stop));
        if !excluded {
            self.summary.unique_count += 1;
            self.summary.bases_total += stop - start + 1;
        }

        let read_start = match mapping.strand {
            Strand::Forward => start,
            Strand::Reverse => stop,
        };
        self.profile.add_read_start(mapping.strand, read_start);
        self.profile.add_coverage(mapping.strand, start, stop);

        if let Some(features) = self.features {
            check_adjacency(
                &mut self.candidates,
                features,
                &self.profile.chromosome,
                mapping.strand,
                start,
                stop,
            );
        }
    }

    /// Hand back everything accumulated so far.
    pub fn finish(self) -> (CoverageProfile, AdjacencyCandidates, CoverageSummary) {
        (self.profile, self.candidates, self.summary)
    }
}
