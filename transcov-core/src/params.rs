//! Analysis parameters shared by the coverage and correlation stages.
//!
//! Parameters are immutable once an analysis starts. They can be built in code,
//! taken from [`Default`], or read from a TOML file:
//!
//! ```toml
//! method = "spearman"
//! window_length = 200
//! min_correlation = 85
//! min_peak_coverage = 20
//! ```

use std::fmt::{self, Display};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TranscovError;

/// Chromosomes shorter than this are never scanned for correlation.
pub const DEFAULT_MIN_INTERVAL_SIZE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

impl FromStr for CorrelationMethod {
    type Err = TranscovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            other => Err(TranscovError::InvalidParameter {
                name: "method",
                reason: format!("'{}' is not one of pearson, spearman", other),
            }),
        }
    }
}

impl Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMethod::Pearson => write!(f, "pearson"),
            CorrelationMethod::Spearman => write!(f, "spearman"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParameters {
    pub method: CorrelationMethod,
    /// Width of each correlation window in bases.
    pub window_length: u64,
    /// Minimum absolute correlation, as an integer percentage (0-100).
    pub min_correlation: u8,
    /// Minimum peak depth both tracks must reach inside a window.
    pub min_peak_coverage: u32,
    pub min_interval_size: u64,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        AnalysisParameters {
            method: CorrelationMethod::Pearson,
            window_length: 100,
            min_correlation: 80,
            min_peak_coverage: 10,
            min_interval_size: DEFAULT_MIN_INTERVAL_SIZE,
        }
    }
}

impl AnalysisParameters {
    pub fn validate(&self) -> Result<(), TranscovError> {
        if self.window_length == 0 {
            return Err(TranscovError::InvalidParameter {
                name: "window_length",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.min_correlation > 100 {
            return Err(TranscovError::InvalidParameter {
                name: "min_correlation",
                reason: format!("{} is not a percentage", self.min_correlation),
            });
        }
        Ok(())
    }

    /// Minimum correlation as a fraction in `[0, 1]`.
    pub fn correlation_cutoff(&self) -> f64 {
        f64::from(self.min_correlation) / 100.0
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, TranscovError> {
        let params: AnalysisParameters = toml::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, TranscovError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TranscovError::FileReadError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&raw)
    }
}
