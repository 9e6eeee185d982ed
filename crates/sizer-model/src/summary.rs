//! Dataset summary printed by `describe`

use crate::dataset::Dataset;
use crate::record::{PowerState, NO_CLUSTER, NO_GUEST_OS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Aggregate view of a dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Number of records
    pub total_vms: usize,
    /// Records per power state
    pub power_states: BTreeMap<PowerState, usize>,
    /// Distinct guest OS values, sorted, sentinel excluded
    pub guest_os: Vec<String>,
    /// Distinct clusters, sorted, sentinel excluded
    pub clusters: Vec<String>,
    /// Sum of vCPUs
    pub total_vcpu: u64,
    /// Sum of memory (GiB)
    pub total_ram_gib: f64,
    /// Sum of used storage (GiB)
    pub total_used_storage_gib: f64,
    /// Sum of provisioned storage (GiB)
    pub total_provisioned_storage_gib: f64,
}

impl DatasetSummary {
    /// Summarize a dataset
    #[must_use]
    pub fn of(dataset: &Dataset) -> Self {
        let mut summary = Self {
            total_vms: dataset.len(),
            ..Self::default()
        };
        let mut guest_os = BTreeSet::new();
        let mut clusters = BTreeSet::new();

        for record in dataset {
            *summary.power_states.entry(record.power_state).or_insert(0) += 1;
            if record.guest_os != NO_GUEST_OS {
                guest_os.insert(record.guest_os.clone());
            }
            if record.cluster != NO_CLUSTER {
                clusters.insert(record.cluster.clone());
            }
            summary.total_vcpu += u64::from(record.vcpu_count);
            summary.total_ram_gib += record.ram_gib;
            summary.total_used_storage_gib += record.used_storage_gib;
            summary.total_provisioned_storage_gib += record.provisioned_storage_gib;
        }

        summary.guest_os = guest_os.into_iter().collect();
        summary.clusters = clusters.into_iter().collect();
        summary
    }

    /// Count for one power state
    #[must_use]
    pub fn count(&self, state: PowerState) -> usize {
        self.power_states.get(&state).copied().unwrap_or(0)
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total VMs: {}", self.total_vms)?;
        for (state, count) in &self.power_states {
            writeln!(f, "  {state}: {count}")?;
        }
        writeln!(f, "Clusters ({}):", self.clusters.len())?;
        for cluster in &self.clusters {
            writeln!(f, "  {cluster}")?;
        }
        writeln!(f, "Guest OS ({}):", self.guest_os.len())?;
        for os in &self.guest_os {
            writeln!(f, "  {os}")?;
        }
        writeln!(f, "Total vCPU: {}", self.total_vcpu)?;
        writeln!(f, "Total RAM (GiB): {:.2}", self.total_ram_gib)?;
        writeln!(f, "Total used storage (GiB): {:.2}", self.total_used_storage_gib)?;
        write!(
            f,
            "Total provisioned storage (GiB): {:.2}",
            self.total_provisioned_storage_gib
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::VmRecord;

    fn dataset() -> Dataset {
        vec![
            VmRecord::builder("1")
                .cluster("B")
                .guest_os("Ubuntu")
                .power_state(PowerState::PoweredOn)
                .vcpu_count(2)
                .ram_gib(4.0)
                .storage_gib(100.0, 40.0)
                .build(),
            VmRecord::builder("2")
                .cluster("A")
                .guest_os("Windows")
                .power_state(PowerState::PoweredOn)
                .vcpu_count(4)
                .ram_gib(8.0)
                .storage_gib(200.0, 60.0)
                .build(),
            VmRecord::builder("3")
                .power_state(PowerState::PoweredOff)
                .vcpu_count(1)
                .build(),
        ]
        .into()
    }

    #[test]
    fn counts_and_totals() {
        let summary = DatasetSummary::of(&dataset());
        assert_eq!(summary.total_vms, 3);
        assert_eq!(summary.count(PowerState::PoweredOn), 2);
        assert_eq!(summary.count(PowerState::PoweredOff), 1);
        assert_eq!(summary.count(PowerState::Suspended), 0);
        assert_eq!(summary.total_vcpu, 7);
        assert!((summary.total_ram_gib - 12.0).abs() < f64::EPSILON);
        assert!((summary.total_provisioned_storage_gib - 310.0).abs() < f64::EPSILON);
        assert!((summary.total_used_storage_gib - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn distinct_values_sorted_without_sentinels() {
        let summary = DatasetSummary::of(&dataset());
        assert_eq!(summary.clusters, vec!["A", "B"]);
        assert_eq!(summary.guest_os, vec!["Ubuntu", "Windows"]);
    }

    #[test]
    fn empty_dataset() {
        let summary = DatasetSummary::of(&Dataset::new());
        assert_eq!(summary.total_vms, 0);
        assert!(summary.to_string().starts_with("Total VMs: 0"));
    }
}
