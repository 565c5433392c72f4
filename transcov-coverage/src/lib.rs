//! Strand-specific coverage accumulation for transcov.
//!
//! Mapped reads are folded into dense per-chromosome profiles of read starts and
//! coverage depth. While accumulating, reads spanning two annotated features are
//! counted as operon adjacency evidence, and the read-start totals feed the
//! background threshold estimators.
//!
//! # Example
//!
//! ```
//! use transcov_core::models::{MappingRecord, Strand};
//! use transcov_coverage::CoverageAccumulator;
//!
//! let mut accumulator = CoverageAccumulator::new("chr1", 1_000);
//! accumulator
//!     .accumulate(vec![MappingRecord::new("chr1", 10, 60, Strand::Forward)], "chr1")
//!     .unwrap();
//!
//! assert_eq!(accumulator.profile().coverage_at(Strand::Forward, 30), Some(1));
//! ```

pub mod accumulator;
pub mod errors;
pub mod genome;
pub mod operon;
pub mod profile;
pub mod reading;
pub mod session;
pub mod threshold;

// re-exports
pub use accumulator::{CoverageAccumulator, CoverageSummary, ExcludedRegion, ExclusionMask};
pub use errors::CoverageError;
pub use genome::{CoverageResult, accumulate_genome};
pub use operon::{
    AdjacencyCandidates, FeatureAdjacencyCandidate, FeatureAdjacencyIndex, FeatureIntervals,
};
pub use profile::CoverageProfile;
pub use session::{AccumulationSession, IntervalRequest, MappingEvent, MappingSink, MappingSource};
pub use threshold::{BackgroundThresholdEstimator, ThresholdConfig};
