//! Background noise thresholds for read-start counts.
//!
//! Read starts are modelled as landing uniformly at random over both strands of the
//! genome, i.e. over `2 * genome_length` positions. A position whose read-start count
//! exceeds the threshold is unlikely to be explained by that background.
//!
//! Two estimators are provided and neither is authoritative:
//!
//! - [`BackgroundThresholdEstimator::analytic`] approximates the per-position Poisson
//!   count with a normal distribution of equal mean and variance.
//! - [`BackgroundThresholdEstimator::simulate`] places the reads at random and reads
//!   the cutoff off the resulting histogram.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::errors::CoverageError;

/// Positions per false-positive budget unit: `fraction` is counted per 1000 bases.
const FRACTION_SCALE: f64 = 1000.0;

/// Settings for the background estimators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Accepted false positives per 1000 genome positions.
    pub fraction: f64,
    /// Seed for the simulated estimate.
    pub seed: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            fraction: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundThresholdEstimator {
    genome_length: u64,
    unique_count: u64,
}

impl BackgroundThresholdEstimator {
    pub fn new(genome_length: u64, unique_count: u64) -> Result<Self, CoverageError> {
        if genome_length == 0 {
            return Err(CoverageError::InvalidThresholdInput(
                "genome length must be greater than zero".to_string(),
            ));
        }
        Ok(BackgroundThresholdEstimator {
            genome_length,
            unique_count,
        })
    }

    /// Number of positions reads can start at (both strands).
    pub fn positions(&self) -> u64 {
        2 * self.genome_length
    }

    /// Expected read starts per position.
    pub fn mean(&self) -> f64 {
        self.unique_count as f64 / self.positions() as f64
    }

    ///
    /// Cutoff at the `1 - fraction / 1000` quantile of a normal distribution with
    /// mean and variance equal to [`mean`](Self::mean).
    ///
    pub fn analytic(&self, fraction: f64) -> Result<f64, CoverageError> {
        validate_fraction(fraction)?;
        let mean = self.mean();
        if mean <= 0.0 {
            return Ok(0.0);
        }

        let normal = Normal::new(mean, mean.sqrt())
            .map_err(|e| CoverageError::InvalidThresholdInput(e.to_string()))?;
        let threshold = normal.inverse_cdf(1.0 - fraction / FRACTION_SCALE);
        Ok(threshold.max(0.0))
    }

    ///
    /// Cutoff from a simulated placement of `unique_count` read starts.
    ///
    /// The per-position counts are histogrammed; walking down from the highest
    /// count, positions are added up until they reach the false-positive budget of
    /// `genome_length / 1000 * fraction`. The count level reached is the threshold.
    ///
    pub fn simulate(&self, fraction: f64, seed: u64) -> Result<u32, CoverageError> {
        validate_fraction(fraction)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let positions = self.positions();

        let mut counts = vec![0u32; positions as usize];
        for _ in 0..self.unique_count {
            let bin = rng.random_range(0..positions) as usize;
            counts[bin] += 1;
        }

        let max_count = counts.iter().copied().max().unwrap_or(0);
        let mut histogram = vec![0u64; max_count as usize + 1];
        for &count in &counts {
            histogram[count as usize] += 1;
        }
        drop(counts);

        let budget = self.genome_length as f64 / FRACTION_SCALE * fraction;
        let mut running_total = 0u64;
        let mut threshold = max_count;
        for level in (0..=max_count).rev() {
            threshold = level;
            running_total += histogram[level as usize];
            if running_total as f64 >= budget {
                break;
            }
        }

        Ok(threshold)
    }
}

fn validate_fraction(fraction: f64) -> Result<(), CoverageError> {
    if !(fraction > 0.0 && fraction < FRACTION_SCALE) {
        return Err(CoverageError::InvalidThresholdInput(format!(
            "fraction {} must lie strictly between 0 and {}",
            fraction, FRACTION_SCALE
        )));
    }
    Ok(())
}
