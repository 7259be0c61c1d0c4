use std::path::PathBuf;
use thiserror::Error;

/// Why a source row was left out of the map. Never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("invalid {field} '{value}'")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("coordinate not set (lat={lat}, lon={lon})")]
    UnsetCoordinate { lat: f64, lon: f64 },
    #[error("outside bounding box (lat={lat}, lon={lon})")]
    OutOfBounds { lat: f64, lon: f64 },
}

/// Failures of the collaborators around the core. Fatal for the run.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Failed to open source {path}: {source}")]
    OpenSource {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read source rows: {0}")]
    ReadSource(#[from] csv::Error),
    #[error("Required column '{0}' not found in source")]
    MissingColumn(String),
    #[error("Failed to write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Environment variable {0} is not set")]
    MissingToken(String),
    #[error("Publish request failed: {0}")]
    Publish(String),
}
