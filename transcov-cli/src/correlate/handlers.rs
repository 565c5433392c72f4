use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use fxhash::FxHashMap as HashMap;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use transcov_core::models::TrackId;
use transcov_core::utils::get_chrom_sizes;
use transcov_core::{AnalysisParameters, CorrelationMethod};
use transcov_correlation::{
    AggregateStatistics, CorrelationError, CorrelationInterval, GenomeCorrelation,
    ProfileCoverageSource, ProgressSink, ResultAggregator, correlate_genome,
};
use transcov_coverage::accumulate_genome;

use crate::coverage::handlers::load_mappings;
use crate::write_json;

#[derive(Serialize)]
struct CorrelateOutput {
    parameters: AnalysisParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<GenomeCorrelation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    statistics: AggregateStatistics,
    intervals: Vec<CorrelationInterval>,
}

///
/// Progress bar over both strand passes of every chromosome.
///
struct BarProgress {
    bar: ProgressBar,
    offsets: HashMap<String, u64>,
}

impl BarProgress {
    fn new(chrom_sizes: &[(String, u64)]) -> Result<Self> {
        let mut offsets = HashMap::default();
        let mut total = 0;
        for (chrom, length) in chrom_sizes {
            offsets.insert(chrom.clone(), total);
            total += 2 * length;
        }

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {percent}% {msg}")?,
        );

        Ok(BarProgress { bar, offsets })
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, chromosome: &str, position: u64) {
        let offset = self.offsets.get(chromosome).copied().unwrap_or(0);
        self.bar.set_message(chromosome.to_string());
        self.bar.set_position(offset + position);
    }

    fn is_cancelled(&self) -> bool {
        false
    }
}

fn parse_opt<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .get_one::<String>(name)
        .map(|raw| raw.parse::<T>())
        .transpose()
        .with_context(|| format!("--{} has an invalid value", name))
}

/// Parameters from `--config` (or defaults), overridden by any flags given.
pub fn resolve_parameters(matches: &ArgMatches) -> Result<AnalysisParameters> {
    let mut params = match matches.get_one::<String>("config") {
        Some(p) => AnalysisParameters::from_toml_file(p)
            .with_context(|| format!("Failed to load parameters from {}", p))?,
        None => AnalysisParameters::default(),
    };

    if let Some(method) = parse_opt::<CorrelationMethod>(matches, "method")? {
        params.method = method;
    }
    if let Some(window) = parse_opt::<u64>(matches, "window")? {
        params.window_length = window;
    }
    if let Some(min_correlation) = parse_opt::<u8>(matches, "min-correlation")? {
        params.min_correlation = min_correlation;
    }
    if let Some(min_peak) = parse_opt::<u32>(matches, "min-peak")? {
        params.min_peak_coverage = min_peak;
    }
    if let Some(min_interval_size) = parse_opt::<u64>(matches, "min-interval-size")? {
        params.min_interval_size = min_interval_size;
    }

    params.validate()?;
    Ok(params)
}

pub fn run_correlate(matches: &ArgMatches) -> Result<()> {
    let track_a = matches
        .get_one::<String>("track-a")
        .expect("--track-a is required");
    let track_b = matches
        .get_one::<String>("track-b")
        .expect("--track-b is required");
    let chrom_sizes_path = matches
        .get_one::<String>("chrom-sizes")
        .expect("--chrom-sizes is required");
    let output_path = matches.get_one::<String>("output");

    let params = resolve_parameters(matches)?;
    let chrom_sizes = get_chrom_sizes(chrom_sizes_path)
        .with_context(|| format!("Failed to read chrom sizes from {}", chrom_sizes_path))?;

    let tracks = [TrackId(0), TrackId(1)];
    let mut source = ProfileCoverageSource::new();
    for (track, path) in tracks.iter().zip([track_a, track_b]) {
        let coverage = accumulate_genome(&chrom_sizes, load_mappings(path)?, None, &[])
            .with_context(|| format!("Failed to accumulate coverage for {}", path))?;
        source = source.with_track(*track, Arc::new(coverage));
    }

    let chromosomes: Vec<String> = chrom_sizes.iter().map(|(name, _)| name.clone()).collect();
    let progress = BarProgress::new(&chrom_sizes)?;
    let mut aggregator = ResultAggregator::new();

    let result = correlate_genome(
        &source,
        &progress,
        &params,
        &tracks,
        &chromosomes,
        &mut aggregator,
    );
    progress.bar.finish_and_clear();

    write_correlation(params, result, aggregator, output_path)
}

/// Write every interval the aggregator holds, then return the run's error if it failed.
fn write_correlation(
    parameters: AnalysisParameters,
    result: Result<GenomeCorrelation, CorrelationError>,
    aggregator: ResultAggregator,
    output_path: Option<&String>,
) -> Result<()> {
    let (outcome, error) = match result {
        Ok(outcome) => (Some(outcome), None),
        Err(e) => (None, Some(e)),
    };

    let output = CorrelateOutput {
        parameters,
        outcome,
        error: error.as_ref().map(ToString::to_string),
        statistics: aggregator.statistics(),
        intervals: aggregator.into_intervals(),
    };
    write_json(&output, output_path)?;

    match error {
        Some(e) => Err(e).context("Correlation failed, partial results were written"),
        None => Ok(()),
    }
}
