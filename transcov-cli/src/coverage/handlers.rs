use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use transcov_core::models::{MappingRecord, Strand};
use transcov_core::utils::get_chrom_sizes;
use transcov_coverage::reading::{open_mappings, read_excluded_regions, read_features};
use transcov_coverage::{
    CoverageResult, CoverageSummary, FeatureAdjacencyCandidate, FeatureAdjacencyIndex,
    FeatureIntervals, ThresholdConfig, accumulate_genome,
};

use crate::write_json;

#[derive(Serialize)]
struct CoverageOutput {
    summary: CoverageSummary,
    mean_mapping_length: f64,
    chromosomes: Vec<ChromosomeCoverage>,
    adjacency: Vec<FeatureAdjacencyCandidate>,
    thresholds: Thresholds,
}

#[derive(Serialize)]
struct ChromosomeCoverage {
    chromosome: String,
    length: u64,
    forward_read_starts: u64,
    reverse_read_starts: u64,
}

#[derive(Serialize)]
struct Thresholds {
    config: ThresholdConfig,
    analytic: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulated: Option<u32>,
}

/// Stream every mapping out of `path`, ticking a spinner as records arrive.
pub fn load_mappings(path: &str) -> Result<Vec<MappingRecord>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} mappings)")?,
    );
    pb.set_message(format!("Reading {}", path));

    let mut mappings = Vec::new();
    for record in open_mappings(path).with_context(|| format!("Failed to open {}", path))? {
        mappings.push(record.with_context(|| format!("Bad mapping in {}", path))?);
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(mappings)
}

pub fn run_coverage(matches: &ArgMatches) -> Result<()> {
    let mappings_path = matches
        .get_one::<String>("mappings")
        .expect("--mappings is required");
    let chrom_sizes_path = matches
        .get_one::<String>("chrom-sizes")
        .expect("--chrom-sizes is required");
    let features_path = matches.get_one::<String>("features");
    let exclude_path = matches.get_one::<String>("exclude");
    let output_path = matches.get_one::<String>("output");
    let simulate = matches.get_flag("simulate");

    let config = ThresholdConfig {
        fraction: matches
            .get_one::<String>("fraction")
            .expect("--fraction has a default")
            .parse()
            .context("--fraction must be a number")?,
        seed: matches
            .get_one::<String>("seed")
            .expect("--seed has a default")
            .parse()
            .context("--seed must be a non-negative integer")?,
    };

    let chrom_sizes = get_chrom_sizes(chrom_sizes_path)
        .with_context(|| format!("Failed to read chrom sizes from {}", chrom_sizes_path))?;

    let features = match features_path {
        Some(p) => {
            let features = read_features(p).with_context(|| format!("Failed to read features from {}", p))?;
            Some(FeatureIntervals::build(features))
        }
        None => None,
    };

    let excluded = match exclude_path {
        Some(p) => read_excluded_regions(p)
            .with_context(|| format!("Failed to read excluded regions from {}", p))?,
        None => Vec::new(),
    };

    let mappings = load_mappings(mappings_path)?;
    let result = accumulate_genome(
        &chrom_sizes,
        mappings,
        features.as_ref().map(|f| f as &dyn FeatureAdjacencyIndex),
        &excluded,
    )?;

    let estimator = result.threshold_estimator()?;
    let analytic = estimator.analytic(config.fraction)?;
    let simulated = if simulate {
        Some(estimator.simulate(config.fraction, config.seed)?)
    } else {
        None
    };

    let output = build_output(
        &result,
        Thresholds {
            config,
            analytic,
            simulated,
        },
    );
    write_json(&output, output_path)
}

fn build_output(result: &CoverageResult, thresholds: Thresholds) -> CoverageOutput {
    let chromosomes = result
        .profiles
        .iter()
        .map(|profile| ChromosomeCoverage {
            chromosome: profile.chromosome.clone(),
            length: profile.length,
            forward_read_starts: profile.total_read_starts(Strand::Forward),
            reverse_read_starts: profile.total_read_starts(Strand::Reverse),
        })
        .collect();

    CoverageOutput {
        summary: result.summary,
        mean_mapping_length: result.summary.mean_mapping_length(),
        chromosomes,
        adjacency: result.candidates.values().cloned().collect(),
        thresholds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_load_mappings_reads_bed6() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "chr1\t9\t50\tr1\t60\t+").unwrap();
        writeln!(f, "chr1\t19\t70\tr2\t60\t-").unwrap();
        f.flush().unwrap();

        let mappings = load_mappings(f.path().to_str().unwrap()).unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0], MappingRecord::new("chr1", 10, 50, Strand::Forward));
    }

    #[rstest]
    fn test_output_lists_chromosomes_in_reference_order() {
        let sizes = vec![("chr2".to_string(), 100), ("chr1".to_string(), 100)];
        let result = accumulate_genome(
            &sizes,
            vec![MappingRecord::new("chr1", 10, 20, Strand::Reverse)],
            None,
            &[],
        )
        .unwrap();

        let output = build_output(
            &result,
            Thresholds {
                config: ThresholdConfig::default(),
                analytic: 0.0,
                simulated: None,
            },
        );
        let names: Vec<&str> = output.chromosomes.iter().map(|c| c.chromosome.as_str()).collect();
        assert_eq!(names, vec!["chr2", "chr1"]);
        assert_eq!(output.chromosomes[1].reverse_read_starts, 1);
        assert_eq!(output.mean_mapping_length, 11.0);
    }
}
