//! Correlation of two equally long coverage windows.

use std::cmp::Ordering;

use serde::Serialize;

use transcov_core::CorrelationMethod;

use crate::errors::CorrelationError;

/// Result of scoring one window. `correlation` is NaN when either side has zero variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowScore {
    pub correlation: f64,
    pub peak_a: f64,
    pub peak_b: f64,
}

impl WindowScore {
    /// The smaller of the two peaks.
    pub fn min_peak(&self) -> f64 {
        self.peak_a.min(self.peak_b)
    }
}

///
/// Scores coverage windows with Pearson or Spearman correlation.
///
/// Holds scratch buffers for the rank transform so a driver scanning a whole
/// chromosome does not allocate per window.
///
#[derive(Debug, Default)]
pub struct WindowedCorrelationComputer {
    ranks_a: Vec<f64>,
    ranks_b: Vec<f64>,
    order: Vec<usize>,
}

impl WindowedCorrelationComputer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(
        &mut self,
        track_a: &[f64],
        track_b: &[f64],
        method: CorrelationMethod,
    ) -> Result<WindowScore, CorrelationError> {
        check_lengths(track_a, track_b)?;

        let correlation = match method {
            CorrelationMethod::Pearson => pearson(track_a, track_b)?,
            CorrelationMethod::Spearman => {
                average_ranks(track_a, &mut self.order, &mut self.ranks_a);
                average_ranks(track_b, &mut self.order, &mut self.ranks_b);
                pearson(&self.ranks_a, &self.ranks_b)?
            }
        };

        Ok(WindowScore {
            correlation,
            peak_a: peak(track_a),
            peak_b: peak(track_b),
        })
    }
}

fn check_lengths(a: &[f64], b: &[f64]) -> Result<(), CorrelationError> {
    if a.len() != b.len() {
        return Err(CorrelationError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(CorrelationError::EmptyInput);
    }
    Ok(())
}

fn peak(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Pearson product-moment correlation.
pub fn pearson(a: &[f64], b: &[f64]) -> Result<f64, CorrelationError> {
    check_lengths(a, b)?;
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    Ok(covariance / (var_a * var_b).sqrt())
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(a: &[f64], b: &[f64]) -> Result<f64, CorrelationError> {
    WindowedCorrelationComputer::new()
        .score(a, b, CorrelationMethod::Spearman)
        .map(|score| score.correlation)
}

///
/// 1-based ranks of `values` written into `ranks`; ties share the mean of the
/// ranks they span.
///
fn average_ranks(values: &[f64], order: &mut Vec<usize>, ranks: &mut Vec<f64>) {
    order.clear();
    order.extend(0..values.len());
    order.sort_by(|&i, &j| values[i].partial_cmp(&values[j]).unwrap_or(Ordering::Equal));

    ranks.clear();
    ranks.resize(values.len(), 0.0);

    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const EPSILON: f64 = 1e-12;

    #[fixture]
    fn ramp() -> Vec<f64> {
        vec![1.0, 4.0, 2.0, 8.0, 5.0, 7.0, 3.0]
    }

    #[rstest]
    #[case(CorrelationMethod::Pearson)]
    #[case(CorrelationMethod::Spearman)]
    fn test_self_correlation_is_one(ramp: Vec<f64>, #[case] method: CorrelationMethod) {
        let score = WindowedCorrelationComputer::new()
            .score(&ramp, &ramp, method)
            .unwrap();
        assert!((score.correlation - 1.0).abs() < EPSILON);
        assert_eq!(score.peak_a, 8.0);
    }

    #[rstest]
    #[case(CorrelationMethod::Pearson)]
    #[case(CorrelationMethod::Spearman)]
    fn test_negation_is_minus_one(ramp: Vec<f64>, #[case] method: CorrelationMethod) {
        let negated: Vec<f64> = ramp.iter().map(|v| -v).collect();
        let score = WindowedCorrelationComputer::new()
            .score(&ramp, &negated, method)
            .unwrap();
        assert!((score.correlation + 1.0).abs() < EPSILON);
        assert_eq!(score.peak_b, -1.0);
    }

    #[rstest]
    fn test_length_mismatch_is_an_error() {
        let result =
            WindowedCorrelationComputer::new().score(&[1.0, 2.0], &[1.0], CorrelationMethod::Pearson);
        assert!(matches!(
            result,
            Err(CorrelationError::LengthMismatch { left: 2, right: 1 })
        ));
    }

    #[rstest]
    fn test_empty_input_is_an_error() {
        let result = WindowedCorrelationComputer::new().score(&[], &[], CorrelationMethod::Spearman);
        assert!(matches!(result, Err(CorrelationError::EmptyInput)));
    }

    #[rstest]
    fn test_constant_window_is_nan() {
        let score = WindowedCorrelationComputer::new()
            .score(&[3.0; 5], &[1.0, 2.0, 3.0, 4.0, 5.0], CorrelationMethod::Pearson)
            .unwrap();
        assert!(score.correlation.is_nan());
        assert_eq!(score.min_peak(), 3.0);
    }

    #[rstest]
    fn test_spearman_ignores_monotone_transform() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.0, 4.0, 9.0, 16.0, 100.0];
        assert!((spearman(&a, &b).unwrap() - 1.0).abs() < EPSILON);
        assert!(pearson(&a, &b).unwrap() < 1.0);
    }

    #[rstest]
    fn test_average_ranks_with_ties() {
        let mut order = Vec::new();
        let mut ranks = Vec::new();
        average_ranks(&[10.0, 20.0, 10.0, 30.0], &mut order, &mut ranks);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[rstest]
    fn test_spearman_with_ties_matches_reference() {
        // pearson over ranks [1.5, 1.5, 3, 4] and [1, 2, 3.5, 3.5]
        let rho = spearman(&[1.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 3.0]).unwrap();
        assert!((rho - 8.0 / 9.0).abs() < EPSILON, "got {}", rho);
    }
}
