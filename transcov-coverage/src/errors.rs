use thiserror::Error;

use transcov_core::TranscovError;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Malformed mapping on {chromosome}: stop {stop} is before start {start}")]
    MalformedMapping {
        chromosome: String,
        start: u64,
        stop: u64,
    },

    #[error("Mapping {start}-{stop} lies outside {chromosome} (length {length})")]
    MappingOutOfBounds {
        chromosome: String,
        start: u64,
        stop: u64,
        length: u64,
    },

    #[error("Mapping on {found} was passed to the accumulator for {expected}")]
    ChromosomeMismatch { expected: String, found: String },

    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("Coverage profile for {0} has already been cleared")]
    ProfileCleared(String),

    #[error("Invalid threshold input: {0}")]
    InvalidThresholdInput(String),

    #[error("Mapping retrieval failed: {0}")]
    MappingFetch(String),

    #[error(transparent)]
    Core(#[from] TranscovError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
