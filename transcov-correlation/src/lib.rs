//! Windowed correlation of two strand-specific coverage tracks.
//!
//! [`IntervalCorrelationDriver`] sweeps one chromosome in non-overlapping windows,
//! first on the forward strand and then on the reverse strand, and hands every
//! window where both tracks are covered and strongly correlated to a
//! [`ResultAggregator`]. Coverage is pulled asynchronously from a
//! [`CoverageSource`]; [`ProfileCoverageSource`] serves it from profiles built by
//! `transcov-coverage`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use transcov_core::AnalysisParameters;
//! use transcov_core::models::{MappingRecord, Strand, TrackId};
//! use transcov_coverage::accumulate_genome;
//! use transcov_correlation::{
//!     CancellationToken, ProfileCoverageSource, ResultAggregator, correlate_genome,
//! };
//!
//! let sizes = vec![("chr1".to_string(), 2_000)];
//! let reads: Vec<MappingRecord> = (0..20)
//!     .map(|i| MappingRecord::new("chr1", 100 + i * 3, 160 + i, Strand::Forward))
//!     .collect();
//! let coverage = Arc::new(accumulate_genome(&sizes, reads, None, &[]).unwrap());
//!
//! let source = ProfileCoverageSource::new()
//!     .with_track(TrackId(0), coverage.clone())
//!     .with_track(TrackId(1), coverage);
//! let mut aggregator = ResultAggregator::new();
//!
//! correlate_genome(
//!     &source,
//!     &CancellationToken::new(),
//!     &AnalysisParameters::default(),
//!     &[TrackId(0), TrackId(1)],
//!     &["chr1".to_string()],
//!     &mut aggregator,
//! )
//! .unwrap();
//!
//! assert!(!aggregator.is_empty());
//! ```

pub mod correlation;
pub mod driver;
pub mod errors;
pub mod genome;
pub mod results;
pub mod source;

// re-exports
pub use correlation::{WindowScore, WindowedCorrelationComputer, pearson, spearman};
pub use driver::{CHUNK_SIZE, DriverState, IntervalCorrelationDriver, SessionStatistics};
pub use errors::CorrelationError;
pub use genome::{GenomeCorrelation, correlate_genome};
pub use results::{AggregateStatistics, CorrelationInterval, ResultAggregator};
pub use source::{
    CancellationToken, ChunkEvent, ChunkSink, CoverageRequest, CoverageSource,
    ProfileCoverageSource, ProgressSink,
};
