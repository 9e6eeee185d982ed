//! LiveOptics normalizer
//!
//! The `VMs` sheet is the main sheet. Two secondary sheets are joined to it
//! by `MOB ID` (left outer, per file):
//!
//! - `VM Performance`: average and peak IOPS and throughput; last row wins
//! - `VM Disks`: per-disk size and usage, summed per VM and used when the
//!   `VMs` sheet has no usable storage figure

use super::{common_fields, read_main_sheet, record_id, storage_value, Normalizer};
use crate::coerce;
use crate::error::{IngestResult, SchemaMismatch};
use crate::schema::{
    ColumnSpec, Field, SchemaRegistry, SourceTool, Unit, DISK_SIZE_HEADERS, DISK_USED_HEADERS,
};
use crate::workbook::{Cell, Table, Workbook};
use sizer_model::{StoragePerformance, VmRecord};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Performance sheet name
pub const PERFORMANCE_SHEET: &str = "VM Performance";

/// Per-disk sheet name
pub const DISKS_SHEET: &str = "VM Disks";

const JOIN_KEY: &str = "MOB ID";

const AVG_COLUMNS: [&str; 4] = [
    "Avg Read IOPS",
    "Avg Write IOPS",
    "Avg Read MB/s",
    "Avg Write MB/s",
];

const PEAK_COLUMNS: [&str; 4] = [
    "Peak Read IOPS",
    "Peak Write IOPS",
    "Peak Read MB/s",
    "Peak Write MB/s",
];

/// Reads the `VMs`, `VM Performance` and `VM Disks` sheets of a LiveOptics export
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveOpticsNormalizer;

/// Summed disk figures for one VM, in GiB
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DiskTotals {
    size: f64,
    used: f64,
}

impl Normalizer for LiveOpticsNormalizer {
    fn tool(&self) -> SourceTool {
        SourceTool::LiveOptics
    }

    fn normalize(
        &self,
        registry: &SchemaRegistry,
        workbook: &mut dyn Workbook,
        first_index: usize,
    ) -> IngestResult<Vec<VmRecord>> {
        let main = read_main_sheet(registry, SourceTool::LiveOptics, workbook)?;
        let path = workbook.path().to_path_buf();
        let performance = performance_index(workbook, &path)?;
        let disks = disk_index(workbook, &path)?;
        let columns = &main.columns;

        let mut joined = 0usize;
        let records: Vec<VmRecord> = main
            .records()
            .enumerate()
            .map(|(offset, row)| {
                let id = record_id(columns, row, first_index + offset);
                let computed = disks.get(&id).copied().unwrap_or_default();
                let provisioned = select_storage(
                    storage_value(columns, row, Field::ProvisionedStorage, &id, &path),
                    computed.size,
                );
                let used = select_storage(
                    storage_value(columns, row, Field::UsedStorage, &id, &path),
                    computed.used,
                );
                let perf = performance.get(&id).copied();
                if perf.is_some() {
                    joined += 1;
                }

                common_fields(columns, row, &id, &path)
                    .storage_gib(provisioned, used)
                    .storage_performance(perf)
                    .build()
            })
            .collect();

        if !performance.is_empty() {
            info!(
                "Joined performance data for {} of {} VMs",
                joined,
                records.len()
            );
        }
        Ok(records)
    }
}

/// Raw value when positive, else the computed value when positive, else 0
/// (the record builder turns 0 into the storage fallback)
fn select_storage(raw: f64, computed: f64) -> f64 {
    if raw > 0.0 {
        raw
    } else if computed > 0.0 {
        computed
    } else {
        0.0
    }
}

fn require(
    table: &Table,
    headers: &[&str],
    sheet: &str,
    path: &Path,
) -> Result<Vec<usize>, SchemaMismatch> {
    let mut found = Vec::with_capacity(headers.len());
    let mut missing = Vec::new();
    for header in headers {
        match table.column(header) {
            Some(index) => found.push(index),
            None => missing.push((*header).to_string()),
        }
    }
    if missing.is_empty() {
        Ok(found)
    } else {
        Err(SchemaMismatch {
            tool: SourceTool::LiveOptics,
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            missing,
        })
    }
}

fn cell(row: &[Cell], index: usize) -> &Cell {
    static EMPTY: Cell = Cell::Empty;
    row.get(index).unwrap_or(&EMPTY)
}

fn join_key(row: &[Cell], key: usize) -> Option<String> {
    coerce::text(cell(row, key))
}

fn performance_index(
    workbook: &mut dyn Workbook,
    path: &Path,
) -> IngestResult<HashMap<String, StoragePerformance>> {
    let Some(table) = workbook.table(PERFORMANCE_SHEET)? else {
        debug!(
            "No '{}' sheet in {}, VMs carry no performance data",
            PERFORMANCE_SHEET,
            path.display()
        );
        return Ok(HashMap::new());
    };

    let key = require(&table, &[JOIN_KEY], PERFORMANCE_SHEET, path)?[0];
    let avg = require(&table, &AVG_COLUMNS, PERFORMANCE_SHEET, path)?;
    let peak: Vec<Option<usize>> = PEAK_COLUMNS.iter().map(|h| table.column(h)).collect();

    let number = |row: &[Cell], index: usize| coerce::number(cell(row, index)).unwrap_or(0.0).max(0.0);
    let optional = |row: &[Cell], index: Option<usize>| {
        index
            .and_then(|i| coerce::number(cell(row, i)))
            .map(|n| n.max(0.0))
    };

    let mut index = HashMap::new();
    for row in table.rows() {
        let Some(id) = join_key(row, key) else {
            continue;
        };
        let perf = StoragePerformance {
            avg_read_iops: number(row, avg[0]),
            avg_write_iops: number(row, avg[1]),
            avg_read_throughput: number(row, avg[2]),
            avg_write_throughput: number(row, avg[3]),
            peak_read_iops: optional(row, peak[0]),
            peak_write_iops: optional(row, peak[1]),
            peak_read_throughput: optional(row, peak[2]),
            peak_write_throughput: optional(row, peak[3]),
        };
        index.insert(id, perf);
    }
    Ok(index)
}

fn disk_index(workbook: &mut dyn Workbook, path: &Path) -> IngestResult<HashMap<String, DiskTotals>> {
    let Some(table) = workbook.table(DISKS_SHEET)? else {
        debug!(
            "No '{}' sheet in {}, storage comes from the VMs sheet only",
            DISKS_SHEET,
            path.display()
        );
        return Ok(HashMap::new());
    };

    let key = require(&table, &[JOIN_KEY], DISKS_SHEET, path)?[0];
    let size_spec = ColumnSpec::any_of(Field::ProvisionedStorage, &DISK_SIZE_HEADERS, Unit::Mib);
    let used_spec = ColumnSpec::any_of(Field::UsedStorage, &DISK_USED_HEADERS, Unit::Mib);
    let (size_index, size_unit) = size_spec.locate(&table).ok_or_else(|| SchemaMismatch {
        tool: SourceTool::LiveOptics,
        path: path.to_path_buf(),
        sheet: DISKS_SHEET.to_string(),
        missing: size_spec.candidates.iter().map(|(h, _)| (*h).to_string()).collect(),
    })?;
    let used = used_spec.locate(&table);

    let mut totals: HashMap<String, DiskTotals> = HashMap::new();
    for row in table.rows() {
        let Some(id) = join_key(row, key) else {
            continue;
        };
        let entry = totals.entry(id).or_default();
        if let Some(size) = coerce::number(cell(row, size_index)) {
            entry.size += size_unit.to_gib(size).max(0.0);
        }
        if let Some((used_index, used_unit)) = used {
            if let Some(value) = coerce::number(cell(row, used_index)) {
                entry.used += used_unit.to_gib(value).max(0.0);
            }
        }
    }
    Ok(totals)
}
