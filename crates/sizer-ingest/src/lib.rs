//! VM Sizer Ingest
//!
//! Reads inventory exports and normalizes them into a canonical
//! [`sizer_model::Dataset`].
//!
//! # Core Concepts
//!
//! - [`Workbook`]: sheet access, backed by `calamine` or by memory
//! - [`SchemaRegistry`]: declarative table of export layouts per tool
//! - [`Normalizer`]: per-tool row mapping, including LiveOptics joins
//! - [`Ingestor`]: multi-file driver with duplicate-id resolution
//!
//! # Example
//!
//! ```rust,ignore
//! use sizer_ingest::{Ingestor, SourceTool};
//!
//! let dataset = Ingestor::new(SourceTool::RvTools)
//!     .ingest_paths(&["export.xlsx".into()])?;
//! println!("{} VMs", dataset.len());
//! ```

#![warn(unreachable_pub)]

mod coerce;
mod error;
mod normalizer;
mod schema;
mod workbook;

pub use error::{IngestError, IngestResult, IngestionError, SchemaMismatch};
pub use normalizer::{
    dedupe_by_id, read_main_sheet, Ingestor, LiveOpticsNormalizer, MainSheet, Normalizer,
    RvToolsNormalizer, DISKS_SHEET, PERFORMANCE_SHEET,
};
pub use schema::{
    ColumnMap, ColumnSpec, Field, ResolvedColumn, SchemaRegistry, SchemaVariant, SourceTool, Unit,
    DISK_SIZE_HEADERS, DISK_USED_HEADERS,
};
pub use workbook::{CalamineWorkbook, Cell, MemoryWorkbook, Table, Workbook};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
