use thiserror::Error;

use transcov_core::TranscovError;
use transcov_core::models::TrackId;

#[derive(Error, Debug)]
pub enum CorrelationError {
    #[error("Tracks have different lengths: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Cannot correlate empty tracks")]
    EmptyInput,

    #[error("Exactly two tracks are required, got {0}")]
    UnsupportedTrackCount(usize),

    #[error(
        "Chunk for {track} covers {chromosome}:{found_from}-{found_to}, expected {expected_from}-{expected_to}"
    )]
    ChunkRangeMismatch {
        track: TrackId,
        chromosome: String,
        expected_from: u64,
        expected_to: u64,
        found_from: u64,
        found_to: u64,
    },

    #[error("Received a second chunk for {0} before the current one was consumed")]
    DuplicateChunk(TrackId),

    #[error("Chunk delivered for {0}, which is not part of this analysis")]
    UnknownTrack(TrackId),

    #[error("No reference length for {track} on {chromosome}")]
    UnknownChromosome { track: TrackId, chromosome: String },

    #[error("Coverage retrieval for {track} failed: {reason}")]
    CoverageFetch { track: TrackId, reason: String },

    #[error(transparent)]
    Core(#[from] TranscovError),
}
