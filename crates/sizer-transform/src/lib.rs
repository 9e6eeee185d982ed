//! VM Sizer Transform
//!
//! Filtering and partitioning of canonical datasets.
//!
//! # Filter chain
//!
//! [`FilterChain`] applies up to three pure predicates in fixed order:
//! power state, include, exclude. Include and exclude match substrings
//! case-insensitively.
//!
//! # Partitioning
//!
//! | Strategy | Groups by | Remainder |
//! |----------|-----------|-----------|
//! | `all_clusters` | every cluster | never |
//! | `some_clusters` | listed clusters | `5_cluster_remainder` |
//! | `guest_os` | OS substring (case-sensitive) | `5_os_remainder` |
//! | `vm_name` | name substring (case-sensitive) | `5_vm_name_remainder` |
//!
//! # Example
//!
//! ```rust
//! use sizer_model::{Dataset, PowerState, VmRecord};
//! use sizer_transform::{FilterChain, GroupingStrategy, PartitionStrategy, PowerStateFilter};
//!
//! let dataset: Dataset = vec![
//!     VmRecord::builder("vm-1").cluster("A").power_state(PowerState::PoweredOn).build(),
//!     VmRecord::builder("vm-2").cluster("B").power_state(PowerState::PoweredOff).build(),
//! ]
//! .into();
//!
//! let stages = FilterChain::new()
//!     .with_power_state(PowerStateFilter::PoweredOn)
//!     .apply(&dataset);
//! let filtered = &stages[0].dataset;
//!
//! let partition = PartitionStrategy::AllClusters.partition(filtered).unwrap();
//! assert_eq!(partition.profiles[0].name, "5_cluster_A");
//! ```

#![warn(unreachable_pub)]

mod error;
mod filter;
mod matcher;
pub mod partition;
mod registry;
mod strategy;

pub use error::ConfigurationError;
pub use filter::{
    FilterChain, FilterField, FilterMode, FilterStep, FilteredStage, PowerStateFilter, TextFilter,
};
pub use matcher::SubstringMatcher;
pub use partition::{ClusterPartitioner, TextMatchPartitioner};
pub use registry::{StrategyRegistry, BUILTIN_STRATEGIES};
pub use strategy::{
    profile_name, sanitize_name, GroupingStrategy, Partition, PartitionStrategy, PROFILE_PREFIX,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
