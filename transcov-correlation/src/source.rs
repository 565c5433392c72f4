//! Collaborators the correlation driver talks to: where coverage comes from and
//! where progress goes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use fxhash::FxHashMap as HashMap;
use log::debug;

use transcov_core::models::{CoverageChunk, Strand, TrackId};
use transcov_coverage::CoverageResult;

/// Coverage wanted for one track over `from..=to` (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRequest {
    pub track: TrackId,
    pub chromosome: String,
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEvent {
    Delivered(CoverageChunk),
    Failed { track: TrackId, reason: String },
}

/// Completion handle for a [`CoverageRequest`]. May be moved to and completed
/// from any thread.
#[derive(Debug, Clone)]
pub struct ChunkSink {
    sender: Sender<ChunkEvent>,
}

impl ChunkSink {
    pub(crate) fn new(sender: Sender<ChunkEvent>) -> Self {
        ChunkSink { sender }
    }

    /// Returns `false` if the driver is gone.
    pub fn deliver(&self, chunk: CoverageChunk) -> bool {
        self.sender.send(ChunkEvent::Delivered(chunk)).is_ok()
    }

    pub fn fail(&self, track: TrackId, reason: impl Into<String>) -> bool {
        self.sender
            .send(ChunkEvent::Failed {
                track,
                reason: reason.into(),
            })
            .is_ok()
    }
}

pub trait CoverageSource {
    /// Length of `chromosome` in the reference `track` was mapped against.
    fn reference_length(&self, track: TrackId, chromosome: &str) -> Option<u64>;

    /// Start fetching coverage. Completion is reported through `sink`, possibly
    /// after this call returns.
    fn request_coverage(&self, request: CoverageRequest, sink: ChunkSink);
}

/// Progress marker and cancellation poll for a running analysis.
pub trait ProgressSink {
    /// `position` grows monotonically within a chromosome across both strand passes.
    fn report(&self, chromosome: &str, position: u64);

    fn is_cancelled(&self) -> bool;
}

/// Shared cancel flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ProgressSink for CancellationToken {
    fn report(&self, _chromosome: &str, _position: u64) {}

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

///
/// Serves coverage chunks out of already accumulated profiles.
///
/// Each chunk is assembled and delivered on the rayon pool, so chunks for the
/// two tracks arrive in no particular order.
///
#[derive(Debug, Clone, Default)]
pub struct ProfileCoverageSource {
    tracks: HashMap<TrackId, Arc<CoverageResult>>,
}

impl ProfileCoverageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, track: TrackId, coverage: Arc<CoverageResult>) -> Self {
        self.tracks.insert(track, coverage);
        self
    }
}

impl CoverageSource for ProfileCoverageSource {
    fn reference_length(&self, track: TrackId, chromosome: &str) -> Option<u64> {
        self.tracks
            .get(&track)?
            .profile(chromosome)
            .map(|profile| profile.length)
    }

    fn request_coverage(&self, request: CoverageRequest, sink: ChunkSink) {
        let Some(coverage) = self.tracks.get(&request.track).cloned() else {
            sink.fail(request.track, "no coverage loaded for this track");
            return;
        };

        rayon::spawn(move || {
            let Some(profile) = coverage.profile(&request.chromosome) else {
                sink.fail(
                    request.track,
                    format!("no profile for {}", request.chromosome),
                );
                return;
            };
            if profile.is_cleared() {
                sink.fail(
                    request.track,
                    format!("profile for {} was cleared", request.chromosome),
                );
                return;
            }

            debug!(
                "serving {} {}:{}-{}",
                request.track, request.chromosome, request.from, request.to
            );
            sink.deliver(CoverageChunk {
                track: request.track,
                forward: profile.coverage_range(Strand::Forward, request.from, request.to),
                reverse: profile.coverage_range(Strand::Reverse, request.from, request.to),
                chromosome: request.chromosome,
                from: request.from,
                to: request.to,
            });
        });
    }
}
