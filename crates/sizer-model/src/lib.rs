//! VM Sizer Model
//!
//! Canonical shapes shared by every pipeline stage.
//!
//! # Core Concepts
//!
//! - [`VmRecord`]: One virtual machine, normalized from any source tool
//! - [`Dataset`]: Ordered sequence of records
//! - [`Profile`]: Named subset of a dataset, one unit of a sizing request
//! - [`Artifact<T>`]: Hashed envelope persisted between stages
//! - [`DatasetSummary`]: Aggregate counts for `describe`
//!
//! # Example
//!
//! ```rust
//! use sizer_model::{Artifact, Dataset, PowerState, VmRecord};
//!
//! let record = VmRecord::builder("vm-1")
//!     .name("web01")
//!     .power_state(PowerState::PoweredOn)
//!     .storage_gib(100.0, 50.0)
//!     .build();
//! let dataset: Dataset = vec![record].into();
//!
//! let artifact = Artifact::new("1_vmdata_rvtools", 1, dataset).unwrap();
//! assert!(artifact.verify().is_ok());
//! ```

#![warn(unreachable_pub)]

mod artifact;
mod dataset;
mod hash;
mod record;
mod summary;

pub use artifact::{Artifact, ArtifactContent, ArtifactError, ArtifactKind};
pub use dataset::{Dataset, GroupingDimension, Profile};
pub use hash::{ContentHash, HashError};
pub use record::{
    join_ip_addresses, non_negative, storage_or_fallback, PowerState, StoragePerformance,
    VmRecord, VmRecordBuilder, NO_CLUSTER, NO_DATACENTER, NO_GUEST_OS, NO_IP,
    STORAGE_FALLBACK_GIB,
};
pub use summary::DatasetSummary;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
