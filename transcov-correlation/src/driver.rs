//! Two-strand windowed correlation sweep over one chromosome.
//!
//! The driver walks the chromosome left to right in chunks, first on the
//! forward strand and then again on the reverse strand. For every chunk it asks
//! the [`CoverageSource`] for both tracks, waits until both have arrived, then
//! scores each non-overlapping window of `window_length` bases.
//!
//! ```text
//! Init -> Requesting -> AwaitingData -> Computing -> Requesting
//!                                                 -> StrandSwitch -> Requesting
//!                                                 -> Done
//! ```
//!
//! `Cancelled` is entered after a completed chunk when the [`ProgressSink`]
//! reports cancellation; `Failed` is entered on any error. All three are terminal.

use std::fmt::{self, Display};

use crossbeam_channel::{Receiver, unbounded};
use log::{debug, info, warn};
use serde::Serialize;

use transcov_core::AnalysisParameters;
use transcov_core::models::{CoverageChunk, Strand, TrackId, TrackPair};

use crate::correlation::{WindowScore, WindowedCorrelationComputer};
use crate::errors::CorrelationError;
use crate::results::{CorrelationInterval, ResultAggregator};
use crate::source::{ChunkEvent, ChunkSink, CoverageRequest, CoverageSource, ProgressSink};

/// Bases fetched per request, rounded down to whole windows.
pub const CHUNK_SIZE: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriverState {
    Init,
    Requesting,
    AwaitingData,
    Computing,
    StrandSwitch,
    Done,
    Cancelled,
    Failed,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DriverState::Done | DriverState::Cancelled | DriverState::Failed
        )
    }
}

impl Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatistics {
    pub requests_issued: u64,
    pub chunks_completed: u64,
    pub windows_scored: u64,
    pub windows_skipped_zero: u64,
    pub intervals_emitted: u64,
}

impl SessionStatistics {
    pub fn merge(&mut self, other: &SessionStatistics) {
        self.requests_issued += other.requests_issued;
        self.chunks_completed += other.chunks_completed;
        self.windows_scored += other.windows_scored;
        self.windows_skipped_zero += other.windows_skipped_zero;
        self.intervals_emitted += other.intervals_emitted;
    }
}

/// Mutable scan state, owned by exactly one driver.
#[derive(Debug)]
struct AnalysisSession {
    cursor: u64,
    strand: Strand,
    right_bound: u64,
    chunk_from: u64,
    chunk_to: u64,
    pending: [Option<CoverageChunk>; 2],
    statistics: SessionStatistics,
}

impl AnalysisSession {
    fn new() -> Self {
        AnalysisSession {
            cursor: 1,
            strand: Strand::Forward,
            right_bound: 0,
            chunk_from: 0,
            chunk_to: 0,
            pending: [None, None],
            statistics: SessionStatistics::default(),
        }
    }

    /// Position marker that keeps growing through the reverse pass.
    fn progress_position(&self) -> u64 {
        match self.strand {
            Strand::Forward => self.chunk_to,
            Strand::Reverse => self.right_bound + self.chunk_to,
        }
    }
}

/// Window accepted only if both peaks reach `min_peak_coverage` and the
/// correlation magnitude exceeds the cutoff. NaN never passes.
fn passes_gates(score: &WindowScore, params: &AnalysisParameters) -> bool {
    let min_peak = f64::from(params.min_peak_coverage);
    score.peak_a >= min_peak
        && score.peak_b >= min_peak
        && score.correlation.abs() > params.correlation_cutoff()
}

fn chunk_span(window: u64, chunk_size: u64) -> u64 {
    if window >= chunk_size {
        window
    } else {
        chunk_size / window * window
    }
}

pub struct IntervalCorrelationDriver<'a> {
    source: &'a dyn CoverageSource,
    progress: &'a dyn ProgressSink,
    params: &'a AnalysisParameters,
    tracks: Vec<TrackId>,
    chromosome: String,
    chunk_size: u64,
    state: DriverState,
    session: AnalysisSession,
    computer: WindowedCorrelationComputer,
    window_a: Vec<f64>,
    window_b: Vec<f64>,
    /// Events for the chunk in flight; replaced on every request.
    receiver: Receiver<ChunkEvent>,
}

impl<'a> IntervalCorrelationDriver<'a> {
    pub fn new(
        source: &'a dyn CoverageSource,
        progress: &'a dyn ProgressSink,
        params: &'a AnalysisParameters,
        tracks: &[TrackId],
        chromosome: impl Into<String>,
    ) -> Self {
        let (_, receiver) = unbounded();
        IntervalCorrelationDriver {
            source,
            progress,
            params,
            tracks: tracks.to_vec(),
            chromosome: chromosome.into(),
            chunk_size: CHUNK_SIZE,
            state: DriverState::Init,
            session: AnalysisSession::new(),
            computer: WindowedCorrelationComputer::new(),
            window_a: Vec::new(),
            window_b: Vec::new(),
            receiver,
        }
    }

    /// Override [`CHUNK_SIZE`].
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.session.statistics
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Step until a terminal state is reached.
    pub fn run(&mut self, aggregator: &mut ResultAggregator) -> Result<DriverState, CorrelationError> {
        loop {
            let state = self.step(aggregator)?;
            if state.is_terminal() {
                return Ok(state);
            }
        }
    }

    ///
    /// Perform one transition. `AwaitingData` blocks until the next chunk event
    /// arrives. On error the driver moves to `Failed`; intervals already handed
    /// to `aggregator` stay there.
    ///
    pub fn step(&mut self, aggregator: &mut ResultAggregator) -> Result<DriverState, CorrelationError> {
        let next = match self.state {
            DriverState::Init => self.initialize(),
            DriverState::Requesting => Ok(self.request_chunk()),
            DriverState::AwaitingData => self.await_data(),
            DriverState::Computing => self.compute(aggregator),
            DriverState::StrandSwitch => Ok(self.switch_strand()),
            terminal => return Ok(terminal),
        };

        match next {
            Ok(state) => {
                if state.is_terminal() {
                    self.finalize(state, aggregator);
                }
                self.state = state;
                Ok(state)
            }
            Err(e) => {
                warn!("correlation of {} failed: {}", self.chromosome, e);
                self.state = DriverState::Failed;
                Err(e)
            }
        }
    }

    fn initialize(&mut self) -> Result<DriverState, CorrelationError> {
        if self.tracks.len() != 2 {
            return Err(CorrelationError::UnsupportedTrackCount(self.tracks.len()));
        }
        self.params.validate()?;

        let right_bound = self
            .source
            .reference_length(self.tracks[0], &self.chromosome)
            .ok_or_else(|| CorrelationError::UnknownChromosome {
                track: self.tracks[0],
                chromosome: self.chromosome.clone(),
            })?;
        self.session.right_bound = right_bound;

        if right_bound < self.params.min_interval_size || self.params.window_length > right_bound {
            info!(
                "skipping {} ({} bp): too short for window {}",
                self.chromosome, right_bound, self.params.window_length
            );
            return Ok(DriverState::Done);
        }

        self.session.cursor = 1;
        self.session.strand = Strand::Forward;
        info!(
            "correlating {} and {} on {} ({} bp, {} window {})",
            self.tracks[0],
            self.tracks[1],
            self.chromosome,
            right_bound,
            self.params.method,
            self.params.window_length
        );
        Ok(DriverState::Requesting)
    }

    fn request_chunk(&mut self) -> DriverState {
        let span = chunk_span(self.params.window_length, self.chunk_size);
        let from = self.session.cursor;
        let to = (from + span - 1).min(self.session.right_bound);

        self.session.chunk_from = from;
        self.session.chunk_to = to;
        self.session.pending = [None, None];

        let (sender, receiver) = unbounded();
        self.receiver = receiver;
        debug!(
            "requesting {}:{}-{} ({})",
            self.chromosome, from, to, self.session.strand
        );
        for &track in &self.tracks {
            self.session.statistics.requests_issued += 1;
            self.source.request_coverage(
                CoverageRequest {
                    track,
                    chromosome: self.chromosome.clone(),
                    from,
                    to,
                },
                ChunkSink::new(sender.clone()),
            );
        }
        // sinks hold the only senders
        drop(sender);

        DriverState::AwaitingData
    }

    fn await_data(&mut self) -> Result<DriverState, CorrelationError> {
        let event = self.receiver.recv().map_err(|_| {
            let missing = self
                .session
                .pending
                .iter()
                .position(Option::is_none)
                .map_or(self.tracks[0], |slot| self.tracks[slot]);
            CorrelationError::CoverageFetch {
                track: missing,
                reason: "request dropped without completing".to_string(),
            }
        })?;

        let chunk = match event {
            ChunkEvent::Delivered(chunk) => chunk,
            ChunkEvent::Failed { track, reason } => {
                return Err(CorrelationError::CoverageFetch { track, reason });
            }
        };

        let slot = self
            .tracks
            .iter()
            .position(|track| *track == chunk.track)
            .ok_or(CorrelationError::UnknownTrack(chunk.track))?;

        if chunk.chromosome != self.chromosome
            || chunk.from != self.session.chunk_from
            || chunk.to != self.session.chunk_to
            || !chunk.is_consistent()
        {
            return Err(CorrelationError::ChunkRangeMismatch {
                track: chunk.track,
                chromosome: chunk.chromosome,
                expected_from: self.session.chunk_from,
                expected_to: self.session.chunk_to,
                found_from: chunk.from,
                found_to: chunk.to,
            });
        }
        if self.session.pending[slot].is_some() {
            return Err(CorrelationError::DuplicateChunk(chunk.track));
        }
        self.session.pending[slot] = Some(chunk);

        if self.session.pending.iter().all(Option::is_some) {
            Ok(DriverState::Computing)
        } else {
            Ok(DriverState::AwaitingData)
        }
    }

    fn compute(&mut self, aggregator: &mut ResultAggregator) -> Result<DriverState, CorrelationError> {
        let [Some(first), Some(second)] = std::mem::take(&mut self.session.pending) else {
            return Ok(DriverState::AwaitingData);
        };

        let window = self.params.window_length;
        let strand = self.session.strand;
        let tracks = TrackPair {
            first: first.track,
            second: second.track,
        };

        let mut position = first.from;
        while position + window - 1 <= first.to {
            if let (Some(a), Some(b)) = (
                first.window(strand, position, window),
                second.window(strand, position, window),
            ) {
                if a.iter().all(|&v| v == 0) && b.iter().all(|&v| v == 0) {
                    self.session.statistics.windows_skipped_zero += 1;
                } else {
                    self.window_a.clear();
                    self.window_a.extend(a.iter().map(|&v| f64::from(v)));
                    self.window_b.clear();
                    self.window_b.extend(b.iter().map(|&v| f64::from(v)));

                    let score = self
                        .computer
                        .score(&self.window_a, &self.window_b, self.params.method)?;
                    self.session.statistics.windows_scored += 1;

                    if passes_gates(&score, self.params) {
                        aggregator.push(CorrelationInterval {
                            tracks,
                            chromosome: self.chromosome.clone(),
                            strand,
                            from: position,
                            to: position + window - 1,
                            correlation: score.correlation,
                            coverage: score.min_peak() as u32,
                        });
                        self.session.statistics.intervals_emitted += 1;
                    }
                }
            }
            position += window;
        }

        self.session.statistics.chunks_completed += 1;
        self.session.cursor = first.to + 1;
        self.progress
            .report(&self.chromosome, self.session.progress_position());

        if self.progress.is_cancelled() {
            info!(
                "correlation of {} cancelled at {} ({})",
                self.chromosome, first.to, strand
            );
            return Ok(DriverState::Cancelled);
        }

        if self.session.cursor + window - 1 <= self.session.right_bound {
            Ok(DriverState::Requesting)
        } else if strand == Strand::Forward {
            Ok(DriverState::StrandSwitch)
        } else {
            Ok(DriverState::Done)
        }
    }

    fn switch_strand(&mut self) -> DriverState {
        debug!("{}: forward pass complete, scanning reverse strand", self.chromosome);
        self.session.strand = self.session.strand.opposite();
        self.session.cursor = 1;
        DriverState::Requesting
    }

    fn finalize(&self, state: DriverState, aggregator: &ResultAggregator) {
        let stats = &self.session.statistics;
        info!(
            "{} {}: {} windows scored, {} zero windows skipped, {} intervals ({} total held)",
            self.chromosome,
            state,
            stats.windows_scored,
            stats.windows_skipped_zero,
            stats.intervals_emitted,
            aggregator.len()
        );
    }
}
