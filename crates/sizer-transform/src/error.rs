//! Configuration errors for filters and partitioning

/// Invalid or incomplete filter / partition parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// One half of a paired parameter was given without the other
    #[error("'{given}' was given without '{missing}'")]
    MissingParameter {
        /// Parameter that was supplied
        given: &'static str,
        /// Parameter that is required alongside it
        missing: &'static str,
    },

    /// A list parameter is present but empty
    #[error("'{parameter}' must list at least one value")]
    EmptyList {
        /// Offending parameter
        parameter: &'static str,
    },

    /// Value not recognized for a parameter
    #[error("unknown {parameter} '{value}' (expected one of: {expected})")]
    UnknownValue {
        /// Parameter name
        parameter: &'static str,
        /// Value given
        value: String,
        /// Accepted values
        expected: String,
    },

    /// Matcher could not be compiled
    #[error("invalid match pattern: {0}")]
    InvalidPattern(String),
}

impl ConfigurationError {
    /// Create missing-parameter error
    #[inline]
    #[must_use]
    pub fn missing(given: &'static str, missing: &'static str) -> Self {
        Self::MissingParameter { given, missing }
    }

    /// Create unknown-value error
    #[must_use]
    pub fn unknown(parameter: &'static str, value: impl Into<String>, expected: &[&str]) -> Self {
        Self::UnknownValue {
            parameter,
            value: value.into(),
            expected: expected.join(", "),
        }
    }
}

impl From<regex::Error> for ConfigurationError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}
