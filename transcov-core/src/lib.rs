//! Shared models for transcov.
//!
//! This crate holds the plain data types passed between the coverage accumulation
//! stage and the correlation sweep: strands, mappings, features, coverage chunks,
//! and the immutable [`AnalysisParameters`](params::AnalysisParameters).

pub mod errors;
pub mod models;
pub mod params;
pub mod utils;

pub use errors::TranscovError;
pub use params::{AnalysisParameters, CorrelationMethod};
