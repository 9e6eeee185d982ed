//! Error types for the pipeline
//!
//! [`PipelineError`] is the union every stage error converts into. Library
//! errors keep their own types and arrive here through `#[from]`.

use sizer_ingest::{IngestError, IngestionError, SchemaMismatch};
use sizer_model::ArtifactError;
use sizer_payload::PayloadError;
use sizer_transform::ConfigurationError;
use std::path::{Path, PathBuf};

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Inputs could not be turned into a dataset
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    /// Filter or partition parameters are invalid
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Artifact could not be encoded, decoded or verified
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Sizing request could not be built
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Pipeline configuration file could not be parsed
    #[error("cannot load config {path}: {message}")]
    ConfigFile {
        /// Offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Filesystem operation failed
    #[error("io error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Manifest entry disagrees with the stored profile
    #[error("manifest lists '{name}' with {expected} records, artifact has {actual}")]
    ManifestMismatch {
        /// Profile name
        name: String,
        /// Count in the manifest
        expected: usize,
        /// Count in the artifact
        actual: usize,
    },
}

impl PipelineError {
    /// Create io error for path
    #[inline]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create config-file error for path
    #[inline]
    pub fn config_file(path: impl AsRef<Path>, message: impl std::fmt::Display) -> Self {
        Self::ConfigFile {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Check if the error was raised before any input was read
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::ConfigFile { .. }
                | Self::Payload(PayloadError::InvalidFactor { .. })
                | Self::Ingest(IngestError::Ingestion(IngestionError::NoInputFiles))
        )
    }
}

impl From<IngestionError> for PipelineError {
    fn from(err: IngestionError) -> Self {
        Self::Ingest(err.into())
    }
}

impl From<SchemaMismatch> for PipelineError {
    fn from(err: SchemaMismatch) -> Self {
        Self::Ingest(err.into())
    }
}

/// Result alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_flagged() {
        let err: PipelineError = ConfigurationError::missing("include_field", "include_values").into();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("include_values"));

        let err: PipelineError = IngestionError::NoInputFiles.into();
        assert!(err.is_configuration());

        let err = PipelineError::io("out", std::io::Error::other("disk full"));
        assert!(!err.is_configuration());
    }
}
