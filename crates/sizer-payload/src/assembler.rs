//! Profile-to-request assembly

use crate::config::SizingConfiguration;
use crate::error::PayloadError;
use crate::request::{ComputeInfo, MemoryInfo, SizerRequest, StorageInfo, VmInfo, WorkloadProfile};
use serde::{Deserialize, Serialize};
use sizer_model::{
    storage_or_fallback, Profile, StoragePerformance, VmRecord, STORAGE_FALLBACK_GIB,
};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Which storage figure is reported to the sizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoragePolicy {
    /// Size on allocated capacity
    #[default]
    Provisioned,
    /// Size on consumed capacity
    Utilized,
}

impl StoragePolicy {
    /// Configuration name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provisioned => "provisioned",
            Self::Utilized => "utilized",
        }
    }

    /// The chosen figure in GiB, with the fallback applied
    #[must_use]
    pub fn storage_gib(self, record: &VmRecord) -> f64 {
        let raw = match self {
            Self::Provisioned => record.provisioned_storage_gib,
            Self::Utilized => record.used_storage_gib,
        };
        storage_or_fallback(raw)
    }
}

impl fmt::Display for StoragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoragePolicy {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provisioned" => Ok(Self::Provisioned),
            "utilized" | "used" => Ok(Self::Utilized),
            _ => Err(PayloadError::UnknownStoragePolicy(s.to_string())),
        }
    }
}

/// Truncate toward zero; negatives and NaN become 0
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[inline]
fn whole(value: f64) -> u64 {
    value.max(0.0).trunc() as u64
}

/// Whole GiB for the vmdk fields; anything that truncates to zero falls back
fn vmdk_gib(storage: f64) -> u64 {
    match whole(storage) {
        0 => whole(STORAGE_FALLBACK_GIB),
        gib => gib,
    }
}

fn whole_opt(value: Option<f64>) -> Option<u64> {
    value.map(whole)
}

fn storage_info(gib: u64, perf: Option<&StoragePerformance>) -> StorageInfo {
    let mut info = StorageInfo {
        vmdk_total: gib,
        vmdk_used: gib,
        ..StorageInfo::default()
    };
    if let Some(perf) = perf {
        info.read_iops = Some(whole(perf.avg_read_iops));
        info.write_iops = Some(whole(perf.avg_write_iops));
        info.read_throughput_mbps = Some(whole(perf.avg_read_throughput));
        info.write_throughput_mbps = Some(whole(perf.avg_write_throughput));
        info.peak_read_iops = whole_opt(perf.peak_read_iops);
        info.peak_write_iops = whole_opt(perf.peak_write_iops);
        info.peak_read_throughput_mbps = whole_opt(perf.peak_read_throughput);
        info.peak_write_throughput_mbps = whole_opt(perf.peak_write_throughput);
    }
    info
}

/// Builds a [`SizerRequest`] from profiles
#[derive(Debug, Clone, Default)]
pub struct PayloadAssembler {
    configuration: SizingConfiguration,
    storage_policy: StoragePolicy,
}

impl PayloadAssembler {
    /// Create assembler with the given configuration block
    #[inline]
    #[must_use]
    pub fn new(configuration: SizingConfiguration) -> Self {
        Self {
            configuration,
            storage_policy: StoragePolicy::default(),
        }
    }

    /// With storage policy
    #[inline]
    #[must_use]
    pub fn with_storage_policy(mut self, policy: StoragePolicy) -> Self {
        self.storage_policy = policy;
        self
    }

    /// Active storage policy
    #[inline]
    #[must_use]
    pub fn storage_policy(&self) -> StoragePolicy {
        self.storage_policy
    }

    /// Convert one record
    #[must_use]
    pub fn vm_info(&self, record: &VmRecord) -> VmInfo {
        let storage = self.storage_policy.storage_gib(record);
        let gib = vmdk_gib(storage);
        if record.storage_performance.is_none() {
            debug!("VM {} has no performance data", record.id);
        }
        VmInfo {
            vm_id: record.id.clone(),
            vm_name: record.name.clone(),
            vm_compute_info: ComputeInfo {
                v_cpu: u64::from(record.vcpu_count),
            },
            vm_memory_info: MemoryInfo {
                v_ram: whole(record.ram_gib),
            },
            vm_storage_info: storage_info(gib, record.storage_performance.as_ref()),
        }
    }

    /// Convert one profile
    #[must_use]
    pub fn workload_profile(&self, profile: &Profile) -> WorkloadProfile {
        WorkloadProfile {
            profile_name: profile.name.clone(),
            separate_cluster: true,
            is_enabled: profile.enabled,
            vm_list: profile.dataset.iter().map(|r| self.vm_info(r)).collect(),
        }
    }

    /// Assemble the full request
    ///
    /// # Errors
    /// Returns [`PayloadError::NoProfiles`] for an empty profile list, or
    /// [`PayloadError::InvalidFactor`] if the configuration is out of range
    pub fn assemble(&self, profiles: &[Profile]) -> Result<SizerRequest, PayloadError> {
        if profiles.is_empty() {
            return Err(PayloadError::NoProfiles);
        }
        self.configuration.validate()?;

        let workload_profiles: Vec<WorkloadProfile> =
            profiles.iter().map(|p| self.workload_profile(p)).collect();
        let request = SizerRequest {
            configurations: self.configuration.clone(),
            workload_profiles,
        };
        info!(
            "Assembled sizing request: {} profiles, {} VM entries, {} storage",
            request.workload_profiles.len(),
            request.vm_count(),
            self.storage_policy
        );
        Ok(request)
    }
}
