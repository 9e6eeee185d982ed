//! VM Sizer Core
//!
//! Pipeline orchestration: configuration, artifact store and stage
//! sequencing from inventory workbooks to a sizing request.
//!
//! # Core Concepts
//!
//! - [`PipelineConfig`]: The one configuration object, from file or flags
//! - [`Pipeline`]: Runs ingest, filter, partition and assemble in order
//! - [`ArtifactStore`]: Atomic, hash-verified stage outputs on disk
//! - [`RunOutcome`]: Artifacts written, the request, and empty-result warnings
//!
//! # Example
//!
//! ```rust,no_run
//! use sizer_core::{Pipeline, PipelineConfig};
//! use sizer_ingest::SourceTool;
//! use sizer_transform::PowerStateFilter;
//!
//! let config = PipelineConfig::new(SourceTool::RvTools)
//!     .with_inputs(vec!["input/inventory.xlsx".into()])
//!     .with_power_state(PowerStateFilter::PoweredOn)
//!     .with_partition("all_clusters", None, false);
//!
//! let outcome = Pipeline::new(config)?.run()?;
//! println!("{} profiles", outcome.profiles.len());
//! # Ok::<(), sizer_core::PipelineError>(())
//! ```

#![warn(unreachable_pub)]

mod config;
mod error;
mod pipeline;
mod store;
mod warning;

pub use config::{PipelineConfig, DEFAULT_OUTPUT_DIR};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{
    Pipeline, RunOutcome, StageReport, INGEST_STAGE, PARTITION_STAGE, UNPARTITIONED_ARTIFACT,
};
pub use store::{ArtifactStore, ManifestEntry, ProfileManifest, MANIFEST_FILE, REQUEST_FILE};
pub use warning::EmptyResultWarning;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
