//! Cluster partitioning

use super::NameAllocator;
use crate::error::ConfigurationError;
use crate::strategy::{profile_name, GroupingStrategy, Partition};
use sizer_model::{Dataset, GroupingDimension, Profile, VmRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Remainder profile name for the subset strategy
pub const CLUSTER_REMAINDER: &str = "5_cluster_remainder";

/// Groups records by exact cluster name
///
/// Without a cluster list every cluster becomes a profile and there is never
/// a remainder. With a list only those clusters become profiles; the rest
/// goes to [`CLUSTER_REMAINDER`] when requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPartitioner<'a> {
    clusters: Option<&'a [String]>,
    include_remainder: bool,
}

impl ClusterPartitioner<'static> {
    /// Every cluster
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self {
            clusters: None,
            include_remainder: false,
        }
    }
}

impl<'a> ClusterPartitioner<'a> {
    /// Listed clusters only
    #[inline]
    #[must_use]
    pub fn subset(clusters: &'a [String], include_remainder: bool) -> Self {
        Self {
            clusters: Some(clusters),
            include_remainder,
        }
    }

    fn group(dataset: &Dataset) -> BTreeMap<&str, Vec<VmRecord>> {
        let mut groups: BTreeMap<&str, Vec<VmRecord>> = BTreeMap::new();
        for record in dataset {
            groups
                .entry(record.cluster.as_str())
                .or_default()
                .push(record.clone());
        }
        groups
    }
}

impl GroupingStrategy for ClusterPartitioner<'_> {
    fn validate(&self) -> Result<(), ConfigurationError> {
        match self.clusters {
            Some([]) => Err(ConfigurationError::EmptyList {
                parameter: "profile_list",
            }),
            _ => Ok(()),
        }
    }

    fn partition(&self, dataset: &Dataset) -> Result<Partition, ConfigurationError> {
        self.validate()?;
        let mut groups = Self::group(dataset);
        let mut names = NameAllocator::default();

        let wanted: Option<BTreeSet<&str>> = self
            .clusters
            .map(|list| list.iter().map(String::as_str).collect());

        if let Some(wanted) = &wanted {
            for cluster in wanted {
                if !groups.contains_key(cluster) {
                    warn!("Cluster {} not present in the data, skipping", cluster);
                }
            }
        }

        let selected: Vec<&str> = groups
            .keys()
            .copied()
            .filter(|cluster| wanted.as_ref().map_or(true, |w| w.contains(cluster)))
            .collect();

        let mut profiles = Vec::with_capacity(selected.len());
        for cluster in selected {
            let records = groups.remove(cluster).unwrap_or_default();
            let name = names.allocate(profile_name("cluster", cluster));
            profiles.push(Profile::grouped(
                name,
                GroupingDimension::Cluster,
                cluster,
                records.into(),
            ));
        }

        let remainder = if wanted.is_some() && self.include_remainder {
            let keep: &[String] = self.clusters.unwrap_or_default();
            let rest = dataset.select(|r| !keep.contains(&r.cluster));
            Some(Profile::remainder(
                names.allocate(CLUSTER_REMAINDER.to_string()),
                GroupingDimension::Cluster,
                rest,
            ))
        } else {
            None
        };

        info!(
            "Partitioned {} VMs into {} cluster profiles{}",
            dataset.len(),
            profiles.len(),
            if remainder.is_some() { " plus remainder" } else { "" }
        );
        Ok(Partition {
            profiles,
            remainder,
        })
    }

    fn name(&self) -> &'static str {
        if self.clusters.is_some() {
            "some_clusters"
        } else {
            "all_clusters"
        }
    }

    fn dimension(&self) -> GroupingDimension {
        GroupingDimension::Cluster
    }
}
