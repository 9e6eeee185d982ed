//! Persisted pipeline artifacts
//!
//! Every stage output is wrapped in an [`Artifact`] envelope before it is
//! written: name, stage number, creation time and the content hash of the
//! payload. Reading an artifact back verifies both the declared kind and the
//! hash, so a later stage can be re-pointed at an earlier run's output
//! without trusting it blindly.

use crate::dataset::{Dataset, Profile};
use crate::hash::{ContentHash, HashError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Canonical or filtered dataset
    Dataset,
    /// Partitioned profile
    Profile,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset => f.write_str("dataset"),
            Self::Profile => f.write_str("profile"),
        }
    }
}

/// Content that can be wrapped in an [`Artifact`]
pub trait ArtifactContent: Serialize + DeserializeOwned + fmt::Debug + Clone + PartialEq {
    /// Kind recorded in the envelope
    const KIND: ArtifactKind;

    /// Number of VM records carried
    fn record_count(&self) -> usize;

    /// Hash of the content
    ///
    /// # Errors
    /// Returns error if the content cannot be serialized
    fn content_hash(&self) -> Result<ContentHash, HashError> {
        ContentHash::of_json(self)
    }
}

impl ArtifactContent for Dataset {
    const KIND: ArtifactKind = ArtifactKind::Dataset;

    fn record_count(&self) -> usize {
        self.len()
    }
}

impl ArtifactContent for Profile {
    const KIND: ArtifactKind = ArtifactKind::Profile;

    fn record_count(&self) -> usize {
        self.len()
    }
}

/// Errors raised while building, encoding or verifying artifacts
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Stored hash does not match the content
    #[error("artifact '{name}' failed integrity check: expected {expected}, got {actual}")]
    HashMismatch {
        /// Artifact name
        name: String,
        /// Hash recorded in the envelope
        expected: ContentHash,
        /// Hash of the content as read
        actual: ContentHash,
    },

    /// Envelope declares a different kind than requested
    #[error("artifact '{name}' is a {actual}, expected a {expected}")]
    KindMismatch {
        /// Artifact name
        name: String,
        /// Kind requested by the caller
        expected: ArtifactKind,
        /// Kind recorded in the envelope
        actual: ArtifactKind,
    },

    /// Hashing failed
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// Envelope could not be encoded or decoded
    #[error("artifact encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Named, hashed stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact<T> {
    name: String,
    kind: ArtifactKind,
    stage: u8,
    created_at: DateTime<Utc>,
    content_hash: ContentHash,
    record_count: usize,
    content: T,
}

impl<T: ArtifactContent> Artifact<T> {
    /// Wrap content produced by `stage`
    ///
    /// # Errors
    /// Returns error if the content cannot be hashed
    pub fn new(name: impl Into<String>, stage: u8, content: T) -> Result<Self, ArtifactError> {
        let content_hash = content.content_hash()?;
        Ok(Self {
            name: name.into(),
            kind: T::KIND,
            stage,
            created_at: Utc::now(),
            content_hash,
            record_count: content.record_count(),
            content,
        })
    }

    /// Artifact name (file stem)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage number that produced it
    #[inline]
    #[must_use]
    pub fn stage(&self) -> u8 {
        self.stage
    }

    /// Creation time
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Recorded content hash
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    /// Number of records carried
    #[inline]
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Borrow the content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &T {
        &self.content
    }

    /// Take the content
    #[inline]
    #[must_use]
    pub fn into_content(self) -> T {
        self.content
    }

    /// Check kind and hash against the content
    ///
    /// # Errors
    /// Returns [`ArtifactError::KindMismatch`] or [`ArtifactError::HashMismatch`]
    pub fn verify(&self) -> Result<(), ArtifactError> {
        if self.kind != T::KIND {
            return Err(ArtifactError::KindMismatch {
                name: self.name.clone(),
                expected: T::KIND,
                actual: self.kind,
            });
        }
        let actual = self.content.content_hash()?;
        if actual != self.content_hash {
            return Err(ArtifactError::HashMismatch {
                name: self.name.clone(),
                expected: self.content_hash,
                actual,
            });
        }
        Ok(())
    }

    /// Pretty JSON encoding
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn to_json(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode and verify
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or verification fails
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.verify()?;
        Ok(artifact)
    }
}
