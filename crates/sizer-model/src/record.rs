//! Canonical VM record
//!
//! The normalized shape every ingestion path converges to. Records are built
//! once by a schema normalizer and never mutated afterwards; later stages only
//! select or group them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage assigned when neither the raw nor the computed value is usable.
pub const STORAGE_FALLBACK_GIB: f64 = 10.0;

/// Sentinel for records without a cluster.
pub const NO_CLUSTER: &str = "no cluster";

/// Sentinel for records without a datacenter.
pub const NO_DATACENTER: &str = "no datacenter";

/// Sentinel for records without a guest operating system.
pub const NO_GUEST_OS: &str = "none specified";

/// Sentinel for records without any IP address.
pub const NO_IP: &str = "no ip";

/// VM power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerState {
    /// Running
    #[serde(rename = "poweredOn")]
    PoweredOn,

    /// Stopped
    #[serde(rename = "poweredOff")]
    PoweredOff,

    /// Suspended to disk
    #[serde(rename = "suspended")]
    Suspended,

    /// Anything the source tool reported that is not one of the above
    #[serde(rename = "other")]
    Other,
}

impl PowerState {
    /// Map a source-tool power state label.
    ///
    /// Matching ignores case, whitespace and separators so that
    /// `poweredOn`, `Powered On` and `powered_on` are equivalent.
    /// Unrecognized labels map to [`PowerState::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let folded: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match folded.as_str() {
            "poweredon" | "on" | "running" => Self::PoweredOn,
            "poweredoff" | "off" | "stopped" => Self::PoweredOff,
            "suspended" => Self::Suspended,
            _ => Self::Other,
        }
    }

    /// Canonical label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PoweredOn => "poweredOn",
            Self::PoweredOff => "poweredOff",
            Self::Suspended => "suspended",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage performance telemetry
///
/// Only present for sources that expose performance data. Throughput values
/// are MB/s as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StoragePerformance {
    /// Average read IOPS
    pub avg_read_iops: f64,
    /// Average write IOPS
    pub avg_write_iops: f64,
    /// Average read throughput (MB/s)
    pub avg_read_throughput: f64,
    /// Average write throughput (MB/s)
    pub avg_write_throughput: f64,
    /// Peak read IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_read_iops: Option<f64>,
    /// Peak write IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_write_iops: Option<f64>,
    /// Peak read throughput (MB/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_read_throughput: Option<f64>,
    /// Peak write throughput (MB/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_write_throughput: Option<f64>,
}

/// One virtual machine, independent of the source-tool schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    /// Source-tool identifier, never empty
    pub id: String,
    /// Display name
    pub name: String,
    /// Cluster or [`NO_CLUSTER`]
    pub cluster: String,
    /// Datacenter or [`NO_DATACENTER`]
    pub datacenter: String,
    /// Power state
    pub power_state: PowerState,
    /// Guest OS description or [`NO_GUEST_OS`]
    pub guest_os: String,
    /// Guest hostname (may be empty)
    pub guest_hostname: String,
    /// Comma separated addresses or [`NO_IP`]
    pub ip_addresses: String,
    /// Virtual CPU count
    pub vcpu_count: u32,
    /// Memory in GiB
    pub ram_gib: f64,
    /// Provisioned storage in GiB
    pub provisioned_storage_gib: f64,
    /// Used storage in GiB
    pub used_storage_gib: f64,
    /// Performance telemetry, when the source exposes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_performance: Option<StoragePerformance>,
    /// Inventory folder (RVTools only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Resource pool (RVTools only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<String>,
}

impl VmRecord {
    /// Start building a record with the given identifier
    #[inline]
    #[must_use]
    pub fn builder(id: impl Into<String>) -> VmRecordBuilder {
        VmRecordBuilder::new(id)
    }

    /// Provisioned storage, substituting the fallback for unusable values
    #[inline]
    #[must_use]
    pub fn provisioned_or_fallback(&self) -> f64 {
        storage_or_fallback(self.provisioned_storage_gib)
    }

    /// Used storage, substituting the fallback for unusable values
    #[inline]
    #[must_use]
    pub fn used_or_fallback(&self) -> f64 {
        storage_or_fallback(self.used_storage_gib)
    }
}

/// Replace zero, negative or non-finite storage with [`STORAGE_FALLBACK_GIB`]
#[inline]
#[must_use]
pub fn storage_or_fallback(gib: f64) -> f64 {
    if gib.is_finite() && gib > 0.0 {
        gib
    } else {
        STORAGE_FALLBACK_GIB
    }
}

/// Clamp a coerced numeric value into the non-negative range
#[inline]
#[must_use]
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Join up to four addresses into the canonical `ip_addresses` field
///
/// Blank and placeholder entries are dropped, duplicates keep their first
/// position, and an empty result becomes [`NO_IP`].
#[must_use]
pub fn join_ip_addresses<'a, I>(addresses: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut kept: Vec<&str> = Vec::with_capacity(4);
    for address in addresses {
        let address = address.trim();
        if address.is_empty() || address.eq_ignore_ascii_case(NO_IP) {
            continue;
        }
        if !kept.contains(&address) {
            kept.push(address);
        }
        if kept.len() == 4 {
            break;
        }
    }

    if kept.is_empty() {
        NO_IP.to_string()
    } else {
        kept.join(", ")
    }
}

/// Builder enforcing the record invariants
///
/// Sentinels replace blank text fields, numeric fields are clamped to zero
/// and storage falls back to [`STORAGE_FALLBACK_GIB`].
#[derive(Debug, Clone)]
pub struct VmRecordBuilder {
    record: VmRecord,
}

impl VmRecordBuilder {
    /// Create builder with defaults for everything but the identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            record: VmRecord {
                id: id.into(),
                name: String::new(),
                cluster: NO_CLUSTER.to_string(),
                datacenter: NO_DATACENTER.to_string(),
                power_state: PowerState::Other,
                guest_os: NO_GUEST_OS.to_string(),
                guest_hostname: String::new(),
                ip_addresses: NO_IP.to_string(),
                vcpu_count: 0,
                ram_gib: 0.0,
                provisioned_storage_gib: 0.0,
                used_storage_gib: 0.0,
                storage_performance: None,
                folder: None,
                resource_pool: None,
            },
        }
    }

    /// Display name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.record.name = name.into();
        self
    }

    /// Cluster (blank keeps the sentinel)
    #[must_use]
    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.record.cluster = or_sentinel(cluster.into(), NO_CLUSTER);
        self
    }

    /// Datacenter (blank keeps the sentinel)
    #[must_use]
    pub fn datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.record.datacenter = or_sentinel(datacenter.into(), NO_DATACENTER);
        self
    }

    /// Power state
    #[must_use]
    pub fn power_state(mut self, state: PowerState) -> Self {
        self.record.power_state = state;
        self
    }

    /// Guest OS (blank keeps the sentinel)
    #[must_use]
    pub fn guest_os(mut self, os: impl Into<String>) -> Self {
        self.record.guest_os = or_sentinel(os.into(), NO_GUEST_OS);
        self
    }

    /// Guest hostname
    #[must_use]
    pub fn guest_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.record.guest_hostname = hostname.into().trim().to_string();
        self
    }

    /// IP addresses, joined through [`join_ip_addresses`]
    #[must_use]
    pub fn ip_addresses<'a, I>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.record.ip_addresses = join_ip_addresses(addresses);
        self
    }

    /// Virtual CPU count
    #[must_use]
    pub fn vcpu_count(mut self, vcpu: u32) -> Self {
        self.record.vcpu_count = vcpu;
        self
    }

    /// Memory in GiB
    #[must_use]
    pub fn ram_gib(mut self, gib: f64) -> Self {
        self.record.ram_gib = non_negative(gib);
        self
    }

    /// Provisioned and used storage in GiB
    #[must_use]
    pub fn storage_gib(mut self, provisioned: f64, used: f64) -> Self {
        self.record.provisioned_storage_gib = provisioned;
        self.record.used_storage_gib = used;
        self
    }

    /// Performance telemetry
    #[must_use]
    pub fn storage_performance(mut self, perf: Option<StoragePerformance>) -> Self {
        self.record.storage_performance = perf;
        self
    }

    /// Inventory folder
    #[must_use]
    pub fn folder(mut self, folder: Option<String>) -> Self {
        self.record.folder = folder.filter(|f| !f.trim().is_empty());
        self
    }

    /// Resource pool
    #[must_use]
    pub fn resource_pool(mut self, pool: Option<String>) -> Self {
        self.record.resource_pool = pool.filter(|p| !p.trim().is_empty());
        self
    }

    /// Finish the record, applying the storage fallback
    #[must_use]
    pub fn build(mut self) -> VmRecord {
        self.record.provisioned_storage_gib =
            storage_or_fallback(self.record.provisioned_storage_gib);
        self.record.used_storage_gib = storage_or_fallback(self.record.used_storage_gib);
        self.record
    }
}

fn or_sentinel(value: String, sentinel: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        sentinel.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_labels() {
        assert_eq!(PowerState::from_label("poweredOn"), PowerState::PoweredOn);
        assert_eq!(PowerState::from_label("Powered Off"), PowerState::PoweredOff);
        assert_eq!(PowerState::from_label("SUSPENDED"), PowerState::Suspended);
        assert_eq!(PowerState::from_label("unknown"), PowerState::Other);
        assert_eq!(PowerState::from_label(""), PowerState::Other);
    }

    #[test]
    fn power_state_serde_uses_canonical_labels() {
        let json = serde_json::to_string(&PowerState::PoweredOn).unwrap();
        assert_eq!(json, "\"poweredOn\"");
        let back: PowerState = serde_json::from_str("\"suspended\"").unwrap();
        assert_eq!(back, PowerState::Suspended);
    }

    #[test]
    fn builder_applies_sentinels() {
        let record = VmRecord::builder("vm-1")
            .cluster("  ")
            .datacenter("")
            .guest_os("nan")
            .build();

        assert_eq!(record.cluster, NO_CLUSTER);
        assert_eq!(record.datacenter, NO_DATACENTER);
        assert_eq!(record.guest_os, NO_GUEST_OS);
        assert_eq!(record.ip_addresses, NO_IP);
    }

    #[test]
    fn builder_applies_storage_fallback() {
        let record = VmRecord::builder("vm-1").storage_gib(0.0, f64::NAN).build();
        assert_eq!(record.provisioned_storage_gib, STORAGE_FALLBACK_GIB);
        assert_eq!(record.used_storage_gib, STORAGE_FALLBACK_GIB);

        let kept = VmRecord::builder("vm-2").storage_gib(100.0, 50.0).build();
        assert_eq!(kept.provisioned_storage_gib, 100.0);
        assert_eq!(kept.used_storage_gib, 50.0);
    }

    #[test]
    fn builder_clamps_memory() {
        let record = VmRecord::builder("vm-1").ram_gib(-4.0).build();
        assert_eq!(record.ram_gib, 0.0);
    }

    #[test]
    fn ip_join_suppresses_placeholders() {
        assert_eq!(
            join_ip_addresses(["10.0.0.1", "no ip", "", "10.0.0.2"]),
            "10.0.0.1, 10.0.0.2"
        );
        assert_eq!(join_ip_addresses(["no ip", "no ip"]), NO_IP);
        assert_eq!(join_ip_addresses(["10.0.0.1", "10.0.0.1"]), "10.0.0.1");
    }

    #[test]
    fn fallback_helpers() {
        assert_eq!(storage_or_fallback(0.0), STORAGE_FALLBACK_GIB);
        assert_eq!(storage_or_fallback(-1.0), STORAGE_FALLBACK_GIB);
        assert_eq!(storage_or_fallback(2.5), 2.5);
        assert_eq!(non_negative(f64::INFINITY), 0.0);
    }
}
