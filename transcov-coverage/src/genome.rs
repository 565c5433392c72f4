use fxhash::FxHashMap as HashMap;
use log::info;
use rayon::prelude::*;

use transcov_core::models::MappingRecord;

use crate::accumulator::{CoverageAccumulator, CoverageSummary, ExcludedRegion, ExclusionMask};
use crate::errors::CoverageError;
use crate::operon::{AdjacencyCandidates, FeatureAdjacencyIndex, merge_candidates};
use crate::profile::CoverageProfile;
use crate::threshold::BackgroundThresholdEstimator;

///
/// Everything produced by accumulating one track: a profile per chromosome in
/// reference order, adjacency candidates sorted by upstream feature id, and the
/// read statistics.
///
#[derive(Debug, Clone, Default)]
pub struct CoverageResult {
    pub profiles: Vec<CoverageProfile>,
    pub candidates: AdjacencyCandidates,
    pub summary: CoverageSummary,
}

impl CoverageResult {
    pub fn profile(&self, chromosome: &str) -> Option<&CoverageProfile> {
        self.profiles.iter().find(|p| p.chromosome == chromosome)
    }

    pub fn genome_length(&self) -> u64 {
        self.profiles.iter().map(|p| p.length).sum()
    }

    pub fn threshold_estimator(&self) -> Result<BackgroundThresholdEstimator, CoverageError> {
        BackgroundThresholdEstimator::new(self.genome_length(), self.summary.unique_count)
    }

    pub(crate) fn push(&mut self, accumulator: CoverageAccumulator<'_>) {
        let (profile, candidates, summary) = accumulator.finish();
        self.profiles.push(profile);
        merge_candidates(&mut self.candidates, candidates);
        self.summary.merge(&summary);
    }

    /// Release every profile's position arrays.
    pub fn clear(&mut self) {
        self.profiles.iter_mut().for_each(CoverageProfile::clear);
    }
}

///
/// Accumulate a whole genome's mappings, one chromosome per rayon task.
///
/// Mappings on a chromosome missing from `chrom_sizes` are a contract violation.
///
pub fn accumulate_genome(
    chrom_sizes: &[(String, u64)],
    mappings: Vec<MappingRecord>,
    features: Option<&dyn FeatureAdjacencyIndex>,
    excluded: &[ExcludedRegion],
) -> Result<CoverageResult, CoverageError> {
    let mut by_chrom: HashMap<String, Vec<MappingRecord>> = HashMap::default();
    for mapping in mappings {
        by_chrom
            .entry(mapping.chromosome.clone())
            .or_default()
            .push(mapping);
    }
    if let Some(unknown) = by_chrom
        .keys()
        .find(|chrom| !chrom_sizes.iter().any(|(name, _)| name == *chrom))
    {
        return Err(CoverageError::UnknownChromosome(unknown.clone()));
    }

    let work: Vec<(&str, u64, Vec<MappingRecord>)> = chrom_sizes
        .iter()
        .map(|(name, length)| {
            (
                name.as_str(),
                *length,
                by_chrom.remove(name).unwrap_or_default(),
            )
        })
        .collect();

    let accumulators = work
        .into_par_iter()
        .map(|(chrom, length, batch)| {
            let mut accumulator = CoverageAccumulator::new(chrom, length);
            if let Some(mask) = ExclusionMask::from_regions(chrom, length, excluded) {
                accumulator = accumulator.with_exclusions(mask);
            }
            if let Some(features) = features {
                accumulator = accumulator.with_features(features);
            }
            accumulator.accumulate(batch, chrom)?;
            Ok(accumulator)
        })
        .collect::<Result<Vec<_>, CoverageError>>()?;

    let mut result = CoverageResult::default();
    for accumulator in accumulators {
        result.push(accumulator);
    }

    info!(
        "accumulated {} mappings over {} chromosomes ({} unique, {} adjacency candidates)",
        result.summary.mappings,
        result.profiles.len(),
        result.summary.unique_count,
        result.candidates.len()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use transcov_core::models::Strand;

    #[fixture]
    fn chrom_sizes() -> Vec<(String, u64)> {
        vec![("chr1".to_string(), 200), ("chr2".to_string(), 100)]
    }

    #[rstest]
    fn test_accumulate_genome_keeps_reference_order(chrom_sizes: Vec<(String, u64)>) {
        let mappings = vec![
            MappingRecord::new("chr2", 10, 20, Strand::Forward),
            MappingRecord::new("chr1", 50, 60, Strand::Reverse),
            MappingRecord::new("chr2", 15, 30, Strand::Forward),
        ];

        let result = accumulate_genome(&chrom_sizes, mappings, None, &[]).unwrap();

        let names: Vec<&str> = result.profiles.iter().map(|p| p.chromosome.as_str()).collect();
        assert_eq!(names, vec!["chr1", "chr2"]);
        assert_eq!(result.genome_length(), 300);
        assert_eq!(result.summary.mappings, 3);
        assert_eq!(
            result.profile("chr2").unwrap().coverage_at(Strand::Forward, 17),
            Some(2)
        );
    }

    #[rstest]
    fn test_accumulate_genome_unknown_chromosome(chrom_sizes: Vec<(String, u64)>) {
        let mappings = vec![MappingRecord::new("chrX", 10, 20, Strand::Forward)];
        let result = accumulate_genome(&chrom_sizes, mappings, None, &[]);
        assert!(matches!(result, Err(CoverageError::UnknownChromosome(_))));
    }

    #[rstest]
    fn test_exclusions_apply_per_chromosome(chrom_sizes: Vec<(String, u64)>) {
        let excluded = vec![ExcludedRegion {
            chromosome: "chr2".to_string(),
            start: 1,
            stop: 50,
        }];
        let mappings = vec![
            MappingRecord::new("chr1", 10, 20, Strand::Forward),
            MappingRecord::new("chr2", 10, 20, Strand::Forward),
        ];

        let result = accumulate_genome(&chrom_sizes, mappings, None, &excluded).unwrap();
        assert_eq!(result.summary.unique_count, 1);
        assert_eq!(result.threshold_estimator().unwrap().positions(), 600);
    }
}
