//! Schema normalizers
//!
//! A [`Normalizer`] turns the sheets of one workbook into canonical records.
//! [`Ingestor`] drives the normalizer for the declared tool over every input
//! file, concatenates the results and resolves duplicate identifiers.

use crate::coerce;
use crate::error::{IngestError, IngestResult, IngestionError};
use crate::schema::{ColumnMap, Field, SchemaRegistry, SchemaVariant, SourceTool};
use crate::workbook::{CalamineWorkbook, Cell, Table, Workbook};
use indexmap::IndexMap;
use sizer_model::{Dataset, PowerState, VmRecord, VmRecordBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

mod liveoptics;
mod rvtools;

pub use liveoptics::{LiveOpticsNormalizer, DISKS_SHEET, PERFORMANCE_SHEET};
pub use rvtools::RvToolsNormalizer;

/// Converts one workbook of a known tool into canonical records
pub trait Normalizer {
    /// Tool this normalizer understands
    fn tool(&self) -> SourceTool;

    /// Normalize every data row of the workbook
    ///
    /// `first_index` is the position of this workbook's first record in the
    /// concatenated input, used to synthesize missing identifiers.
    ///
    /// # Errors
    /// Returns [`IngestError`] if the main sheet is absent or unrecognized
    fn normalize(
        &self,
        registry: &SchemaRegistry,
        workbook: &mut dyn Workbook,
        first_index: usize,
    ) -> IngestResult<Vec<VmRecord>>;
}

/// Main sheet of a workbook matched to a registered layout
#[derive(Debug)]
pub struct MainSheet<'r> {
    /// Matched layout
    pub variant: &'r SchemaVariant,
    /// Sheet contents
    pub table: Table,
    /// Resolved columns
    pub columns: ColumnMap,
}

impl MainSheet<'_> {
    /// Data rows that are not entirely blank
    pub fn records(&self) -> impl Iterator<Item = &[Cell]> {
        self.table
            .rows()
            .iter()
            .map(Vec::as_slice)
            .filter(|row| !row.iter().all(Cell::is_blank))
    }
}

/// Locate the main sheet of `tool` and resolve its layout
///
/// # Errors
/// - [`IngestionError::MissingSheet`] when none of the tool's sheets exist
/// - [`crate::SchemaMismatch`] when no probe header matches or required
///   columns are missing
pub fn read_main_sheet<'r>(
    registry: &'r SchemaRegistry,
    tool: SourceTool,
    workbook: &mut dyn Workbook,
) -> IngestResult<MainSheet<'r>> {
    let path = workbook.path().to_path_buf();
    let sheets = registry.sheets_for(tool);
    let mut inspected = None;

    for sheet in &sheets {
        let Some(table) = workbook.table(sheet)? else {
            continue;
        };
        if let Some(variant) = registry.detect(tool, sheet, &table) {
            debug!(
                "Detected {} layout {} in {}",
                tool,
                variant.version,
                path.display()
            );
            let columns = variant.resolve(&table, &path)?;
            return Ok(MainSheet {
                variant,
                table,
                columns,
            });
        }
        inspected.get_or_insert(*sheet);
    }

    match inspected {
        Some(sheet) => Err(crate::SchemaMismatch {
            tool,
            path,
            sheet: sheet.to_string(),
            missing: registry.probes_for(tool, sheet),
        }
        .into()),
        None => Err(IngestionError::missing_sheet(
            path,
            sheets.first().copied().unwrap_or_default(),
        )
        .into()),
    }
}

/// Source identifier, or `generated-<index>` when the cell is blank
pub(crate) fn record_id(columns: &ColumnMap, row: &[Cell], index: usize) -> String {
    coerce::text(columns.cell(row, Field::Id)).unwrap_or_else(|| format!("generated-{index}"))
}

/// Builder prefilled with the fields every tool maps the same way
///
/// Storage is left at zero; each normalizer applies its own selection.
pub(crate) fn common_fields(
    columns: &ColumnMap,
    row: &[Cell],
    id: &str,
    path: &Path,
) -> VmRecordBuilder {
    let name = coerce::text(columns.cell(row, Field::Name)).unwrap_or_default();
    let power_state = coerce::text(columns.cell(row, Field::PowerState))
        .map_or(PowerState::Other, |label| PowerState::from_label(&label));

    let vcpu = coerce::count(columns.cell(row, Field::Vcpu)).unwrap_or_else(|| {
        log_coercion(columns.cell(row, Field::Vcpu), "vCPU", id, path);
        0
    });
    let ram = columns.gib(row, Field::Memory).unwrap_or_else(|| {
        log_coercion(columns.cell(row, Field::Memory), "memory", id, path);
        0.0
    });

    let addresses: Vec<String> = (1..=4)
        .filter_map(|slot| coerce::text(columns.cell(row, Field::Ip(slot))))
        .collect();

    VmRecord::builder(id)
        .name(name)
        .cluster(coerce::text(columns.cell(row, Field::Cluster)).unwrap_or_default())
        .datacenter(coerce::text(columns.cell(row, Field::Datacenter)).unwrap_or_default())
        .power_state(power_state)
        .guest_os(coerce::text(columns.cell(row, Field::GuestOs)).unwrap_or_default())
        .guest_hostname(coerce::text(columns.cell(row, Field::GuestHostname)).unwrap_or_default())
        .ip_addresses(addresses.iter().map(String::as_str))
        .vcpu_count(vcpu)
        .ram_gib(ram)
}

/// Storage cell in GiB, logging unparsable content
pub(crate) fn storage_value(
    columns: &ColumnMap,
    row: &[Cell],
    field: Field,
    id: &str,
    path: &Path,
) -> f64 {
    columns.gib(row, field).unwrap_or_else(|| {
        log_coercion(columns.cell(row, field), "storage", id, path);
        0.0
    })
}

fn log_coercion(cell: &Cell, what: &str, id: &str, path: &Path) {
    if !cell.is_blank() {
        debug!(
            "Unparsable {} value '{}' for {} in {}, using 0",
            what,
            cell,
            id,
            path.display()
        );
    }
}

/// Collapse duplicate identifiers
///
/// The last occurrence of an id replaces earlier ones but keeps the slot of
/// the first, so the output order follows first appearance. Returns the
/// deduplicated dataset and the number of replaced records.
#[must_use]
pub fn dedupe_by_id(records: Vec<VmRecord>) -> (Dataset, usize) {
    let total = records.len();
    let mut by_id: IndexMap<String, VmRecord> = IndexMap::with_capacity(total);
    for record in records {
        by_id.insert(record.id.clone(), record);
    }
    let replaced = total - by_id.len();
    (by_id.into_values().collect(), replaced)
}

/// Drives normalization over all inputs of one declared tool
#[derive(Debug, Clone)]
pub struct Ingestor {
    tool: SourceTool,
    registry: SchemaRegistry,
}

impl Ingestor {
    /// Create an ingestor with the built-in layouts
    #[must_use]
    pub fn new(tool: SourceTool) -> Self {
        Self {
            tool,
            registry: SchemaRegistry::with_defaults(),
        }
    }

    /// Use a custom layout registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Declared tool
    #[inline]
    #[must_use]
    pub fn tool(&self) -> SourceTool {
        self.tool
    }

    fn normalizer(&self) -> Box<dyn Normalizer> {
        match self.tool {
            SourceTool::RvTools => Box::new(RvToolsNormalizer),
            SourceTool::LiveOptics => Box::new(LiveOpticsNormalizer),
        }
    }

    /// Open and normalize workbook files in order
    ///
    /// # Errors
    /// Returns [`IngestError`] if no paths are given, a file cannot be read,
    /// or a workbook does not match the declared tool
    pub fn ingest_paths(&self, paths: &[PathBuf]) -> IngestResult<Dataset> {
        if paths.is_empty() {
            return Err(IngestionError::NoInputFiles.into());
        }
        let workbooks = paths
            .iter()
            .map(CalamineWorkbook::open)
            .collect::<Result<Vec<_>, _>>()?;
        self.ingest(workbooks)
    }

    /// Normalize already opened workbooks in order
    ///
    /// # Errors
    /// Returns [`IngestError`] if the iterator is empty or a workbook does not
    /// match the declared tool
    pub fn ingest<W, I>(&self, workbooks: I) -> IngestResult<Dataset>
    where
        W: Workbook,
        I: IntoIterator<Item = W>,
    {
        let normalizer = self.normalizer();
        let mut records = Vec::new();
        let mut files = 0usize;

        for mut workbook in workbooks {
            let normalized =
                normalizer.normalize(&self.registry, &mut workbook, records.len())?;
            info!(
                "Read {} {} records from {}",
                normalized.len(),
                self.tool,
                workbook.path().display()
            );
            records.extend(normalized);
            files += 1;
        }

        if files == 0 {
            return Err(IngestError::Ingestion(IngestionError::NoInputFiles));
        }

        let (dataset, replaced) = dedupe_by_id(records);
        if replaced > 0 {
            warn!(
                "Replaced {} records with duplicate ids, last occurrence kept",
                replaced
            );
        }
        info!("Normalized {} VMs from {} files", dataset.len(), files);
        Ok(dataset)
    }
}
