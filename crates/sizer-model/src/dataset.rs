//! Datasets and profiles
//!
//! A [`Dataset`] is an ordered sequence of records. Stages never edit a
//! dataset in place: filtering returns a new one and leaves the input intact.

use crate::record::VmRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered sequence of canonical records
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<VmRecord>,
}

impl Dataset {
    /// Create an empty dataset
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[VmRecord] {
        &self.records
    }

    /// Iterate records in order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, VmRecord> {
        self.records.iter()
    }

    /// New dataset holding the records that satisfy `keep`, order preserved
    #[must_use]
    pub fn select<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&VmRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|record| keep(record))
            .cloned()
            .collect()
    }

    /// Identifiers in order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    /// Consume into the underlying records
    #[inline]
    #[must_use]
    pub fn into_records(self) -> Vec<VmRecord> {
        self.records
    }
}

impl From<Vec<VmRecord>> for Dataset {
    fn from(records: Vec<VmRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<VmRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = VmRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a VmRecord;
    type IntoIter = std::slice::Iter<'a, VmRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Field a profile was grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingDimension {
    /// Grouped by cluster name
    Cluster,
    /// Grouped by guest OS substring
    GuestOs,
    /// Grouped by VM name substring
    VmName,
    /// Whole filtered dataset, no grouping applied
    Unpartitioned,
}

impl fmt::Display for GroupingDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cluster => "cluster",
            Self::GuestOs => "guest_os",
            Self::VmName => "vm_name",
            Self::Unpartitioned => "unpartitioned",
        };
        f.write_str(label)
    }
}

/// Named subset of a dataset, one unit of a sizing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Generated name, also the artifact name
    pub name: String,
    /// Grouping field
    pub dimension: GroupingDimension,
    /// Cluster name or substring this profile matched; `None` for remainders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Whether the sizing service should include this profile
    pub enabled: bool,
    /// True for the catch-all remainder profile
    #[serde(default)]
    pub remainder: bool,
    /// Member records
    pub dataset: Dataset,
}

impl Profile {
    /// Create an enabled profile for a matched group
    #[must_use]
    pub fn grouped(
        name: impl Into<String>,
        dimension: GroupingDimension,
        group: impl Into<String>,
        dataset: Dataset,
    ) -> Self {
        Self {
            name: name.into(),
            dimension,
            group: Some(group.into()),
            enabled: true,
            remainder: false,
            dataset,
        }
    }

    /// Create an enabled remainder profile
    #[must_use]
    pub fn remainder(
        name: impl Into<String>,
        dimension: GroupingDimension,
        dataset: Dataset,
    ) -> Self {
        Self {
            name: name.into(),
            dimension,
            group: None,
            enabled: true,
            remainder: true,
            dataset,
        }
    }

    /// Wrap a whole dataset as a single profile
    #[must_use]
    pub fn unpartitioned(name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            name: name.into(),
            dimension: GroupingDimension::Unpartitioned,
            group: None,
            enabled: true,
            remainder: false,
            dataset,
        }
    }

    /// Number of member records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// True when the profile has no members
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }
}
