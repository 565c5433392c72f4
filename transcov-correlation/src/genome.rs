use log::info;
use serde::Serialize;

use transcov_core::AnalysisParameters;
use transcov_core::models::TrackId;

use crate::driver::{DriverState, IntervalCorrelationDriver, SessionStatistics};
use crate::errors::CorrelationError;
use crate::results::ResultAggregator;
use crate::source::{CoverageSource, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenomeCorrelation {
    /// `Done` if every chromosome was scanned, `Cancelled` otherwise.
    pub state: DriverState,
    pub chromosomes_scanned: usize,
    pub statistics: SessionStatistics,
}

///
/// Run one driver per chromosome, in the given order, collecting into `aggregator`.
///
/// Cancellation is checked before each chromosome as well as after every chunk.
/// An error stops the whole run; whatever was collected stays in `aggregator`.
///
pub fn correlate_genome(
    source: &dyn CoverageSource,
    progress: &dyn ProgressSink,
    params: &AnalysisParameters,
    tracks: &[TrackId],
    chromosomes: &[String],
    aggregator: &mut ResultAggregator,
) -> Result<GenomeCorrelation, CorrelationError> {
    let mut outcome = GenomeCorrelation {
        state: DriverState::Done,
        chromosomes_scanned: 0,
        statistics: SessionStatistics::default(),
    };

    for chromosome in chromosomes {
        if progress.is_cancelled() {
            outcome.state = DriverState::Cancelled;
            break;
        }

        let mut driver =
            IntervalCorrelationDriver::new(source, progress, params, tracks, chromosome.as_str());
        let state = driver.run(aggregator)?;
        outcome.statistics.merge(&driver.statistics());
        outcome.chromosomes_scanned += 1;

        if state == DriverState::Cancelled {
            outcome.state = state;
            break;
        }
    }

    info!(
        "genome correlation {}: {} chromosomes, {} intervals",
        outcome.state,
        outcome.chromosomes_scanned,
        aggregator.len()
    );
    Ok(outcome)
}
