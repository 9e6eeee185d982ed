//! Non-fatal empty-result warnings

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A stage produced no records
///
/// The run continues. Warnings are logged when raised and collected in the
/// run outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResultWarning {
    /// Artifact that came out empty
    pub artifact: String,
    /// Stage number
    pub stage: u8,
    /// Records going into the stage
    pub input_records: usize,
}

impl EmptyResultWarning {
    /// Create and log a warning
    #[must_use]
    pub fn raise(artifact: impl Into<String>, stage: u8, input_records: usize) -> Self {
        let warning = Self {
            artifact: artifact.into(),
            stage,
            input_records,
        };
        warn!("{}", warning);
        warning
    }
}

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {} produced an empty '{}' from {} records",
            self.stage, self.artifact, self.input_records
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_artifact() {
        let w = EmptyResultWarning::raise("3_vmdata_include", 3, 12);
        assert_eq!(
            w.to_string(),
            "stage 3 produced an empty '3_vmdata_include' from 12 records"
        );
    }
}
