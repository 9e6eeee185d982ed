//! Sizing configuration block
//!
//! Passed through to the sizer untouched. Defaults match what the sizing
//! service expects when no tuning is supplied.

use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target cloud for the sizing request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloudType {
    /// VMware Cloud on AWS
    #[default]
    VmcOnAws,
    /// Google Cloud VMware Engine
    Gcve,
}

impl CloudType {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VmcOnAws => "VMC_ON_AWS",
            Self::Gcve => "GCVE",
        }
    }
}

impl fmt::Display for CloudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudType {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "VMC_ON_AWS" | "VMC" => Ok(Self::VmcOnAws),
            "GCVE" => Ok(Self::Gcve),
            _ => Err(PayloadError::UnknownCloudType(s.to_string())),
        }
    }
}

/// Per-VM limits above which the sizer treats a VM as an outlier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutlierLimits {
    /// CPU share of a host
    pub cpu_limit: f64,
    /// Storage share of a host
    pub storage_limit: f64,
    /// Memory share of a host
    pub memory_limit: f64,
}

impl Default for OutlierLimits {
    fn default() -> Self {
        Self {
            cpu_limit: 0.75,
            storage_limit: 0.5,
            memory_limit: 0.75,
        }
    }
}

/// The `configurations` block of a sizing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizingConfiguration {
    /// Target cloud
    pub cloud_type: CloudType,
    /// Cluster topology
    pub cluster_type: String,
    /// vCPU to physical core ratio
    pub compute_overcommit_factor: f64,
    /// Reserved CPU share
    pub cpu_headroom: f64,
    /// Hyper-threading uplift
    pub hyper_threading_factor: f64,
    /// Memory overcommit ratio
    pub memory_overcommit_factor: f64,
    /// Expected CPU utilization
    pub cpu_utilization: f64,
    /// Expected memory utilization
    pub memory_utilization: f64,
    /// Usable share of raw storage
    pub storage_threshold_factor: f64,
    /// Storage compression ratio
    pub compression_ratio: f64,
    /// Storage deduplication ratio
    pub dedup_ratio: f64,
    /// IO access pattern
    pub io_access_pattern: Option<String>,
    /// IO size
    pub io_size: Option<String>,
    /// Read/write IO ratio
    pub io_ratio: Option<String>,
    /// Aggregate IOPS target
    #[serde(rename = "totalIOPs")]
    pub total_iops: Option<f64>,
    /// Size management VMs too
    #[serde(rename = "includeManagementVMs")]
    pub include_management_vms: bool,
    /// Failures-to-tolerate policy
    pub ftt_ftm_type: String,
    /// Global separate-cluster override
    pub separate_cluster: Option<bool>,
    /// Host instance overrides
    pub instance_settings_list: Option<Vec<serde_json::Value>>,
    /// Outlier thresholds
    pub vm_outlier_limits: OutlierLimits,
    /// Management appliance size
    pub appliance_size: String,
    /// Enabled add-ons
    pub addons_list: Vec<String>,
}

impl Default for SizingConfiguration {
    fn default() -> Self {
        Self {
            cloud_type: CloudType::default(),
            cluster_type: "SAZ".to_string(),
            compute_overcommit_factor: 4.0,
            cpu_headroom: 0.15,
            hyper_threading_factor: 1.25,
            memory_overcommit_factor: 1.25,
            cpu_utilization: 1.0,
            memory_utilization: 1.0,
            storage_threshold_factor: 0.8,
            compression_ratio: 1.25,
            dedup_ratio: 1.5,
            io_access_pattern: None,
            io_size: None,
            io_ratio: None,
            total_iops: None,
            include_management_vms: true,
            ftt_ftm_type: "AUTO_AUTO".to_string(),
            separate_cluster: None,
            instance_settings_list: None,
            vm_outlier_limits: OutlierLimits::default(),
            appliance_size: "AUTO".to_string(),
            addons_list: Vec::new(),
        }
    }
}

impl SizingConfiguration {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With target cloud
    #[inline]
    #[must_use]
    pub fn with_cloud_type(mut self, cloud_type: CloudType) -> Self {
        self.cloud_type = cloud_type;
        self
    }

    /// With compute overcommit factor
    #[inline]
    #[must_use]
    pub fn with_compute_overcommit(mut self, factor: f64) -> Self {
        self.compute_overcommit_factor = factor;
        self
    }

    /// With memory overcommit factor
    #[inline]
    #[must_use]
    pub fn with_memory_overcommit(mut self, factor: f64) -> Self {
        self.memory_overcommit_factor = factor;
        self
    }

    /// With CPU headroom
    #[inline]
    #[must_use]
    pub fn with_cpu_headroom(mut self, headroom: f64) -> Self {
        self.cpu_headroom = headroom;
        self
    }

    /// With outlier limits
    #[inline]
    #[must_use]
    pub fn with_outlier_limits(mut self, limits: OutlierLimits) -> Self {
        self.vm_outlier_limits = limits;
        self
    }

    fn factors(&self) -> [(&'static str, f64); 13] {
        [
            ("computeOvercommitFactor", self.compute_overcommit_factor),
            ("cpuHeadroom", self.cpu_headroom),
            ("hyperThreadingFactor", self.hyper_threading_factor),
            ("memoryOvercommitFactor", self.memory_overcommit_factor),
            ("cpuUtilization", self.cpu_utilization),
            ("memoryUtilization", self.memory_utilization),
            ("storageThresholdFactor", self.storage_threshold_factor),
            ("compressionRatio", self.compression_ratio),
            ("dedupRatio", self.dedup_ratio),
            ("totalIOPs", self.total_iops.unwrap_or(0.0)),
            ("vmOutlierLimits.cpuLimit", self.vm_outlier_limits.cpu_limit),
            (
                "vmOutlierLimits.storageLimit",
                self.vm_outlier_limits.storage_limit,
            ),
            (
                "vmOutlierLimits.memoryLimit",
                self.vm_outlier_limits.memory_limit,
            ),
        ]
    }

    /// Check every numeric factor is finite and non-negative
    ///
    /// # Errors
    /// Returns [`PayloadError::InvalidFactor`] naming the first bad factor
    pub fn validate(&self) -> Result<(), PayloadError> {
        match self
            .factors()
            .into_iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            Some((name, value)) => Err(PayloadError::InvalidFactor { name, value }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serialize_in_wire_shape() {
        let json = serde_json::to_value(SizingConfiguration::default()).unwrap();
        assert_eq!(json["cloudType"], "VMC_ON_AWS");
        assert_eq!(json["clusterType"], "SAZ");
        assert_eq!(json["cpuHeadroom"], 0.15);
        assert_eq!(json["storageThresholdFactor"], 0.8);
        assert!(json["totalIOPs"].is_null());
        assert_eq!(json["includeManagementVMs"], true);
        assert_eq!(json["fttFtmType"], "AUTO_AUTO");
        assert!(json["separateCluster"].is_null());
        assert!(json["instanceSettingsList"].is_null());
        assert_eq!(json["vmOutlierLimits"]["storageLimit"], 0.5);
        assert_eq!(json["applianceSize"], "AUTO");
        assert_eq!(json["addonsList"], serde_json::json!([]));
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: SizingConfiguration =
            serde_json::from_str(r#"{"cloudType": "GCVE", "cpuHeadroom": 0.2}"#).unwrap();
        assert_eq!(config.cloud_type, CloudType::Gcve);
        assert!((config.cpu_headroom - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.cluster_type, "SAZ");
    }

    #[test]
    fn cloud_type_parses_loosely() {
        assert_eq!("gcve".parse::<CloudType>().unwrap(), CloudType::Gcve);
        assert_eq!(
            "vmc-on-aws".parse::<CloudType>().unwrap(),
            CloudType::VmcOnAws
        );
        assert!("azure".parse::<CloudType>().is_err());
    }

    #[test]
    fn negative_factor_rejected() {
        let err = SizingConfiguration::new()
            .with_compute_overcommit(-1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            PayloadError::InvalidFactor {
                name: "computeOvercommitFactor",
                ..
            }
        ));
        assert!(SizingConfiguration::default().validate().is_ok());
    }
}
