//! Error types for the ingestion pipeline and the agent boundary.
//!
//! Structural failures (extraction, identification, parsing) are typed
//! so the session can reset cleanly. Agent failures never escape the
//! dispatcher; they are folded into an [`crate::models::Answer`].

use std::path::PathBuf;
use thiserror::Error;

/// The uploaded payload could not be unpacked.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("'{name}' is not a valid ZIP archive: {source}")]
    InvalidArchive {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to prepare scratch space for '{name}': {source}")]
    Scratch {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list extracted files under {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// One or both invoice tables could not be identified by file name.
#[derive(Debug, Error)]
#[error("Could not identify the {} table(s) among: {}", .missing.join(" and "), format_candidates(.candidates))]
pub struct SchemaIdentificationError {
    /// Roles with no matching file ("header", "items").
    pub missing: Vec<&'static str>,
    /// File names that were inspected.
    pub candidates: Vec<String>,
}

fn format_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "no CSV files".to_string()
    } else {
        candidates.join(", ")
    }
}

/// An identified file is not well-formed delimited text.
#[derive(Debug, Error)]
#[error("Failed to load {}: {reason}", .file.display())]
pub struct LoadError {
    pub file: PathBuf,
    pub reason: String,
}

impl LoadError {
    pub fn new(file: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of the loader as a whole.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error(transparent)]
    Identification(#[from] SchemaIdentificationError),

    #[error(transparent)]
    Parse(#[from] LoadError),
}

/// Any failure of the upload pipeline. The session stays empty.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Identification(#[from] SchemaIdentificationError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<LoadFailure> for PipelineError {
    fn from(failure: LoadFailure) -> Self {
        match failure {
            LoadFailure::Identification(e) => PipelineError::Identification(e),
            LoadFailure::Parse(e) => PipelineError::Load(e),
        }
    }
}

/// Coarse classification of an agent failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentErrorKind {
    Connect,
    Timeout,
    Status,
    MalformedResponse,
    Request,
}

/// Failure raised by a [`crate::agent::client::TableAgent`] implementation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
