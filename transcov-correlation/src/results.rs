use serde::Serialize;

use transcov_core::models::{Strand, TrackPair};

///
/// A window where two tracks are strongly correlated.
///
/// `from` and `to` are the first and last 1-based positions of the window.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationInterval {
    pub tracks: TrackPair,
    pub chromosome: String,
    pub strand: Strand,
    pub from: u64,
    pub to: u64,
    pub correlation: f64,
    /// Smaller of the two tracks' peak coverage in the window.
    pub coverage: u32,
}

impl CorrelationInterval {
    pub fn length(&self) -> u64 {
        self.to - self.from + 1
    }

    /// The interval as BED-style `[start, end)` with a 0-based start.
    pub fn zero_based_half_open(&self) -> (u64, u64) {
        (self.from - 1, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateStatistics {
    pub count: usize,
    pub mean_length: f64,
    pub mean_coverage: f64,
}

///
/// Ordered store of every accepted interval plus running statistics.
///
/// One aggregator can collect several analysis runs: later runs append to the
/// intervals already held. [`clear`](Self::clear) starts over.
///
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    intervals: Vec<CorrelationInterval>,
    total_length: u64,
    total_coverage: u64,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interval: CorrelationInterval) {
        self.total_length += interval.length();
        self.total_coverage += u64::from(interval.coverage);
        self.intervals.push(interval);
    }

    pub fn intervals(&self) -> &[CorrelationInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn statistics(&self) -> AggregateStatistics {
        let count = self.intervals.len();
        if count == 0 {
            return AggregateStatistics {
                count,
                mean_length: 0.0,
                mean_coverage: 0.0,
            };
        }
        AggregateStatistics {
            count,
            mean_length: self.total_length as f64 / count as f64,
            mean_coverage: self.total_coverage as f64 / count as f64,
        }
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
        self.total_length = 0;
        self.total_coverage = 0;
    }

    pub fn into_intervals(self) -> Vec<CorrelationInterval> {
        self.intervals
    }
}
