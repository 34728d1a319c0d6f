//! Checking one optimizer backend against another
//!
//! The harness pulls a size stratified sample of published models from the BiGG
//! database, solves each with every backend and method, and compares the results
//! pairwise. Loading failures only drop the affected model from the batch.
use thiserror::Error;

use crate::io::json::JsonError;

pub mod catalog;
pub mod comparator;
pub mod report;
pub mod runner;

/// Largest objective difference for which two results agree
pub const OBJECTIVE_TOLERANCE: f64 = 1e-6;

/// Largest per reaction flux difference before a passing comparison gets a note
pub const FLUX_TOLERANCE: f64 = 1e-4;

/// Timestamp used in output file names and summaries
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Errors raised by the benchmark harness
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unable to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unable to load model: {0}")]
    Model(#[from] JsonError),
    #[error("Unknown benchmark method {0}")]
    UnknownMethod(String),
}

impl BenchmarkError {
    pub(crate) fn io<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        BenchmarkError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
