//! Error types for ingestion
//!
//! - [`IngestionError`]: the input could not be read at all (fatal)
//! - [`SchemaMismatch`]: the workbook was read but is not a known layout

use crate::schema::SourceTool;
use std::fmt;
use std::path::PathBuf;

/// Input could not be read
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// No input files were given
    #[error("no input files given")]
    NoInputFiles,

    /// Workbook could not be opened or a sheet could not be decoded
    #[error("cannot read workbook {path}: {message}")]
    Unreadable {
        /// Offending file
        path: PathBuf,
        /// Reader error
        message: String,
    },

    /// Main sheet absent
    #[error("workbook {path} has no '{sheet}' sheet")]
    MissingSheet {
        /// Offending file
        path: PathBuf,
        /// Sheet that was expected
        sheet: String,
    },
}

impl IngestionError {
    /// Create unreadable error for path
    pub fn unreadable(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Unreadable {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create missing-sheet error for path
    pub fn missing_sheet(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self::MissingSheet {
            path: path.into(),
            sheet: sheet.into(),
        }
    }
}

/// Workbook of a recognized tool lacks expected columns
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{tool} export {path} does not match any known layout: missing {}", .missing.join(", "))]
pub struct SchemaMismatch {
    /// Declared source tool
    pub tool: SourceTool,
    /// Offending file
    pub path: PathBuf,
    /// Sheet that was inspected
    pub sheet: String,
    /// Missing headers (or probe headers when no variant matched)
    pub missing: Vec<String>,
}

/// Any failure while turning files into a dataset
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Input unreadable
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// Layout not recognized
    #[error(transparent)]
    Schema(#[from] SchemaMismatch),
}

/// Result alias for ingestion
pub type IngestResult<T> = Result<T, IngestError>;
