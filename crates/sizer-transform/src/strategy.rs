//! Grouping strategies
//!
//! Provides the [`GroupingStrategy`] trait, the [`Partition`] result every
//! strategy returns, and [`PartitionStrategy`], the configurable tagged
//! variant that dispatches to the concrete strategies.

use crate::error::ConfigurationError;
use crate::partition::{ClusterPartitioner, TextMatchPartitioner};
use serde::{Deserialize, Serialize};
use sizer_model::{Dataset, GroupingDimension, Profile};
use std::fmt::Debug;

/// Splits a dataset into named profiles
pub trait GroupingStrategy: Debug {
    /// Check parameters without touching data
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] for empty or inconsistent parameters
    fn validate(&self) -> Result<(), ConfigurationError>;

    /// Partition the dataset
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] when [`GroupingStrategy::validate`] would
    fn partition(&self, dataset: &Dataset) -> Result<Partition, ConfigurationError>;

    /// Registry name
    fn name(&self) -> &'static str;

    /// Grouping field
    fn dimension(&self) -> GroupingDimension;
}

/// Profiles produced by a strategy, plus the optional remainder
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    /// Matched profiles in strategy order
    pub profiles: Vec<Profile>,
    /// Records no profile claimed, when requested
    pub remainder: Option<Profile>,
}

impl Partition {
    /// Number of profiles including the remainder
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len() + usize::from(self.remainder.is_some())
    }

    /// True when there is neither a profile nor a remainder
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate profiles, remainder last
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter().chain(self.remainder.iter())
    }

    /// Profiles in order, remainder last
    #[must_use]
    pub fn into_profiles(self) -> Vec<Profile> {
        let mut profiles = self.profiles;
        profiles.extend(self.remainder);
        profiles
    }
}

/// Prefix of every profile artifact name
pub const PROFILE_PREFIX: &str = "5_";

/// Replace characters outside `[A-Za-z0-9._-]` with `_`
#[must_use]
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Profile name `5_<kind>_<group>`, sanitized
#[must_use]
pub fn profile_name(kind: &str, group: &str) -> String {
    sanitize_name(&format!("{PROFILE_PREFIX}{kind}_{group}"))
}

/// Configurable grouping strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// One profile per cluster
    AllClusters,
    /// Profiles for listed clusters only
    SomeClusters {
        /// Clusters to profile
        clusters: Vec<String>,
        /// Collect the other records into `5_cluster_remainder`
        #[serde(default)]
        include_remainder: bool,
    },
    /// One profile per guest OS substring
    GuestOs {
        /// Substrings, in profile order
        substrings: Vec<String>,
        /// Collect unmatched records into `5_os_remainder`
        #[serde(default)]
        include_remainder: bool,
    },
    /// One profile per VM name substring
    VmName {
        /// Substrings, in profile order
        substrings: Vec<String>,
        /// Collect unmatched records into `5_vm_name_remainder`
        #[serde(default)]
        include_remainder: bool,
    },
}

impl PartitionStrategy {
    /// Build from a registry name and its list / remainder parameters
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnknownValue`] for an unknown name, or
    /// the validation error of the resulting strategy
    pub fn from_name(
        name: &str,
        values: Vec<String>,
        include_remainder: bool,
    ) -> Result<Self, ConfigurationError> {
        let strategy = match name.trim().to_ascii_lowercase().as_str() {
            "all_clusters" => Self::AllClusters,
            "some_clusters" => Self::SomeClusters {
                clusters: values,
                include_remainder,
            },
            "guest_os" | "os" => Self::GuestOs {
                substrings: values,
                include_remainder,
            },
            "vm_name" | "vmname" => Self::VmName {
                substrings: values,
                include_remainder,
            },
            other => {
                return Err(ConfigurationError::unknown(
                    "partition strategy",
                    other,
                    &crate::registry::BUILTIN_STRATEGIES,
                ))
            }
        };
        strategy.validate()?;
        Ok(strategy)
    }

    fn resolve(&self) -> Box<dyn GroupingStrategy + '_> {
        match self {
            Self::AllClusters => Box::new(ClusterPartitioner::all()),
            Self::SomeClusters {
                clusters,
                include_remainder,
            } => Box::new(ClusterPartitioner::subset(clusters, *include_remainder)),
            Self::GuestOs {
                substrings,
                include_remainder,
            } => Box::new(TextMatchPartitioner::guest_os(substrings, *include_remainder)),
            Self::VmName {
                substrings,
                include_remainder,
            } => Box::new(TextMatchPartitioner::vm_name(substrings, *include_remainder)),
        }
    }
}

impl GroupingStrategy for PartitionStrategy {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.resolve().validate()
    }

    fn partition(&self, dataset: &Dataset) -> Result<Partition, ConfigurationError> {
        self.resolve().partition(dataset)
    }

    fn name(&self) -> &'static str {
        self.resolve().name()
    }

    fn dimension(&self) -> GroupingDimension {
        self.resolve().dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_name("5_guest_os_Windows Server"), "5_guest_os_Windows_Server");
        assert_eq!(profile_name("cluster", "prod/east"), "5_cluster_prod_east");
        assert_eq!(profile_name("cluster", "a.b-c"), "5_cluster_a.b-c");
    }

    #[test]
    fn partition_orders_remainder_last() {
        let partition = Partition {
            profiles: vec![Profile::grouped("5_cluster_A", GroupingDimension::Cluster, "A", Dataset::new())],
            remainder: Some(Profile::remainder(
                "5_cluster_remainder",
                GroupingDimension::Cluster,
                Dataset::new(),
            )),
        };
        assert_eq!(partition.len(), 2);
        let names: Vec<String> = partition.into_profiles().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["5_cluster_A", "5_cluster_remainder"]);
    }

    #[test]
    fn from_name_validates() {
        assert_eq!(
            PartitionStrategy::from_name("all_clusters", Vec::new(), false),
            Ok(PartitionStrategy::AllClusters)
        );
        assert_eq!(
            PartitionStrategy::from_name("guest_os", Vec::new(), false),
            Err(ConfigurationError::EmptyList { parameter: "profile_list" })
        );
        assert!(matches!(
            PartitionStrategy::from_name("by_host", Vec::new(), false),
            Err(ConfigurationError::UnknownValue { .. })
        ));
    }

    #[test]
    fn serde_is_tagged() {
        let strategy = PartitionStrategy::VmName {
            substrings: vec!["sql".into()],
            include_remainder: true,
        };
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["strategy"], "vm_name");
        assert_eq!(json["substrings"][0], "sql");
        let back: PartitionStrategy = serde_json::from_value(json).unwrap();
        assert_eq!(back, strategy);
    }

    #[test]
    fn names_and_dimensions() {
        assert_eq!(PartitionStrategy::AllClusters.name(), "all_clusters");
        let os = PartitionStrategy::GuestOs {
            substrings: vec!["x".into()],
            include_remainder: false,
        };
        assert_eq!(os.dimension(), GroupingDimension::GuestOs);
    }
}
