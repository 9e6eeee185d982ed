//! Sizing request document
//!
//! Field names follow the sizer's camelCase wire format.

use crate::config::SizingConfiguration;
use crate::error::PayloadError;
use serde::{Deserialize, Serialize};

/// Complete request handed to the sizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizerRequest {
    /// Pass-through tuning block
    pub configurations: SizingConfiguration,
    /// One entry per profile
    pub workload_profiles: Vec<WorkloadProfile>,
}

impl SizerRequest {
    /// Total VMs across all profiles, counting overlaps once per profile
    #[must_use]
    pub fn vm_count(&self) -> usize {
        self.workload_profiles.iter().map(|p| p.vm_list.len()).sum()
    }

    /// Pretty-printed JSON document
    ///
    /// # Errors
    /// Returns [`PayloadError::Serialization`] if encoding fails
    pub fn to_json_pretty(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a previously written document
    ///
    /// # Errors
    /// Returns [`PayloadError::Serialization`] on malformed JSON
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One workload block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadProfile {
    /// Profile name
    pub profile_name: String,
    /// Size the profile as its own cluster
    pub separate_cluster: bool,
    /// Include the profile in sizing
    pub is_enabled: bool,
    /// VMs in the profile
    pub vm_list: Vec<VmInfo>,
}

/// One VM as the sizer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmInfo {
    /// Source identifier
    pub vm_id: String,
    /// Display name
    pub vm_name: String,
    /// CPU demand
    pub vm_compute_info: ComputeInfo,
    /// Memory demand
    pub vm_memory_info: MemoryInfo,
    /// Storage demand
    pub vm_storage_info: StorageInfo,
}

/// CPU demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeInfo {
    /// Virtual CPUs
    pub v_cpu: u64,
}

/// Memory demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInfo {
    /// Memory in whole GiB
    pub v_ram: u64,
}

/// Storage demand, with performance figures when the source had them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Disk capacity in whole GiB
    pub vmdk_total: u64,
    /// Disk consumption in whole GiB
    pub vmdk_used: u64,
    /// Average read IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_iops: Option<u64>,
    /// Average write IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_iops: Option<u64>,
    /// Average read MB/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_throughput_mbps: Option<u64>,
    /// Average write MB/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_throughput_mbps: Option<u64>,
    /// Peak read IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_read_iops: Option<u64>,
    /// Peak write IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_write_iops: Option<u64>,
    /// Peak read MB/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_read_throughput_mbps: Option<u64>,
    /// Peak write MB/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_write_throughput_mbps: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_without_performance_has_two_keys() {
        let info = StorageInfo {
            vmdk_total: 100,
            vmdk_used: 100,
            ..StorageInfo::default()
        };
        let json = serde_json::to_value(info).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(json["vmdkTotal"], 100);
    }

    #[test]
    fn compute_and_memory_keys() {
        let json = serde_json::to_value(ComputeInfo { v_cpu: 4 }).unwrap();
        assert_eq!(json["vCpu"], 4);
        let json = serde_json::to_value(MemoryInfo { v_ram: 16 }).unwrap();
        assert_eq!(json["vRam"], 16);
    }

    #[test]
    fn parses_written_document() {
        let request = SizerRequest {
            configurations: SizingConfiguration::default(),
            workload_profiles: vec![WorkloadProfile {
                profile_name: "5_cluster_A".into(),
                separate_cluster: true,
                is_enabled: true,
                vm_list: Vec::new(),
            }],
        };
        let json = request.to_json_pretty().unwrap();
        assert!(json.contains("\"workloadProfiles\""));
        assert_eq!(SizerRequest::from_json(&json).unwrap(), request);
    }
}
