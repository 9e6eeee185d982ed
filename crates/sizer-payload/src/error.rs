//! Payload error types

use thiserror::Error;

/// Errors raised while assembling a sizing request
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Nothing to size
    #[error("No profiles to size, the request would be empty")]
    NoProfiles,

    /// Sizing factor outside its domain
    #[error("Sizing factor {name} must be a non-negative number, got {value}")]
    InvalidFactor {
        /// Wire name of the factor
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Unrecognized cloud type
    #[error("Unknown cloud type '{0}', expected VMC_ON_AWS or GCVE")]
    UnknownCloudType(String),

    /// Unrecognized storage policy
    #[error("Unknown storage policy '{0}', expected provisioned or utilized")]
    UnknownStoragePolicy(String),

    /// JSON encoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
