//! VM Sizer Payload
//!
//! Turns workload profiles into the sizing-request document.
//!
//! # Core Concepts
//!
//! - [`SizingConfiguration`]: Pass-through tuning block with sizer defaults
//! - [`PayloadAssembler`]: One workload block per profile, one entry per VM
//! - [`StoragePolicy`]: Provisioned or utilized capacity for both storage fields
//! - [`SizerRequest`]: The serialized document
//!
//! Workload numbers are truncated to whole units. Storage of zero becomes
//! 10 GiB. Performance fields appear only for VMs that carry them.
//!
//! # Example
//!
//! ```rust
//! use sizer_model::{Dataset, Profile, VmRecord};
//! use sizer_payload::{PayloadAssembler, SizingConfiguration, StoragePolicy};
//!
//! let dataset: Dataset = vec![VmRecord::builder("vm-1").storage_gib(100.0, 50.0).build()].into();
//! let profile = Profile::unpartitioned("1_vmdata_rvtools", dataset);
//!
//! let request = PayloadAssembler::new(SizingConfiguration::default())
//!     .with_storage_policy(StoragePolicy::Utilized)
//!     .assemble(&[profile])
//!     .unwrap();
//! assert_eq!(request.workload_profiles[0].vm_list[0].vm_storage_info.vmdk_total, 50);
//! ```

#![warn(unreachable_pub)]

mod assembler;
mod config;
mod error;
mod request;

pub use assembler::{PayloadAssembler, StoragePolicy};
pub use config::{CloudType, OutlierLimits, SizingConfiguration};
pub use error::PayloadError;
pub use request::{ComputeInfo, MemoryInfo, SizerRequest, StorageInfo, VmInfo, WorkloadProfile};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
