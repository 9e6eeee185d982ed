//! Schema-variant registry
//!
//! Each source tool ships several export layouts that differ in sheet names
//! and unit-labelled headers. A [`SchemaVariant`] describes one layout as
//! data; the registry picks the variant whose probe header is present and
//! resolves its column table against the actual header row.

use crate::error::SchemaMismatch;
use crate::workbook::{Cell, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Collection tool that produced an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTool {
    /// RVTools `vInfo` export
    RvTools,
    /// LiveOptics `VMs` export
    LiveOptics,
}

impl SourceTool {
    /// Lowercase label, used in artifact names
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RvTools => "rvtools",
            Self::LiveOptics => "liveoptics",
        }
    }
}

impl fmt::Display for SourceTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rvtools" | "rv-tools" => Ok(Self::RvTools),
            "liveoptics" | "live-optics" | "lova" => Ok(Self::LiveOptics),
            other => Err(format!(
                "unknown source tool '{other}' (expected rvtools or liveoptics)"
            )),
        }
    }
}

/// Unit carried by a column header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Plain value, no conversion
    None,
    /// Mebibytes (also used for tools that label MiB as MB)
    Mib,
    /// Bytes
    Bytes,
}

impl Unit {
    /// Convert a value in this unit to GiB
    #[inline]
    #[must_use]
    pub fn to_gib(self, value: f64) -> f64 {
        match self {
            Self::None => value,
            Self::Mib => value / 1024.0,
            Self::Bytes => value / (1024.0 * 1024.0 * 1024.0),
        }
    }
}

/// Canonical field a column feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Source identifier
    Id,
    /// VM display name
    Name,
    /// Cluster
    Cluster,
    /// Datacenter
    Datacenter,
    /// Power state label
    PowerState,
    /// Guest OS
    GuestOs,
    /// Guest hostname
    GuestHostname,
    /// IP address slot (1-based)
    Ip(u8),
    /// vCPU count
    Vcpu,
    /// Memory
    Memory,
    /// Provisioned storage
    ProvisionedStorage,
    /// Used storage
    UsedStorage,
    /// Inventory folder
    Folder,
    /// Resource pool
    ResourcePool,
}

impl Field {
    /// Whether a missing column makes the layout unusable
    #[inline]
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Self::Name
                | Self::PowerState
                | Self::Vcpu
                | Self::Memory
                | Self::ProvisionedStorage
                | Self::UsedStorage
        )
    }
}

/// Candidate headers for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Target field
    pub field: Field,
    /// Accepted headers, first match wins, each with its unit
    pub candidates: Vec<(&'static str, Unit)>,
}

impl ColumnSpec {
    /// Column with a single unitless header
    #[must_use]
    pub fn plain(field: Field, header: &'static str) -> Self {
        Self {
            field,
            candidates: vec![(header, Unit::None)],
        }
    }

    /// Column with a single header in `unit`
    #[must_use]
    pub fn in_unit(field: Field, header: &'static str, unit: Unit) -> Self {
        Self {
            field,
            candidates: vec![(header, unit)],
        }
    }

    /// Column accepting any of `candidates`; headers in `preferred` are tried first
    #[must_use]
    pub fn any_of(field: Field, candidates: &[(&'static str, Unit)], preferred: Unit) -> Self {
        let mut candidates = candidates.to_vec();
        candidates.sort_by_key(|(_, unit)| *unit != preferred);
        Self { field, candidates }
    }

    /// Index and unit of the first candidate header present in `table`
    #[must_use]
    pub fn locate(&self, table: &Table) -> Option<(usize, Unit)> {
        self.candidates
            .iter()
            .find_map(|(header, unit)| table.column(header).map(|index| (index, *unit)))
    }

    /// Header reported when the column is missing
    #[must_use]
    pub fn primary_header(&self) -> Option<&'static str> {
        self.candidates.first().map(|(header, _)| *header)
    }
}

/// Disk size headers LiveOptics has used, each with its unit
pub const DISK_SIZE_HEADERS: [(&str, Unit); 3] = [
    ("Virtual Disk Size (MB)", Unit::Mib),
    ("Virtual Disk Size (MiB)", Unit::Mib),
    ("Virtual Disk Size (Bytes)", Unit::Bytes),
];

/// Disk usage headers LiveOptics has used, each with its unit
pub const DISK_USED_HEADERS: [(&str, Unit); 3] = [
    ("Virtual Disk Used (MB)", Unit::Mib),
    ("Virtual Disk Used (MiB)", Unit::Mib),
    ("Virtual Disk Used (Bytes)", Unit::Bytes),
];

/// One export layout of a source tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVariant {
    /// Tool
    pub tool: SourceTool,
    /// Layout label, for logs
    pub version: &'static str,
    /// Main sheet
    pub sheet: &'static str,
    /// Header whose presence selects this layout
    pub probe: &'static str,
    /// Column table
    pub columns: Vec<ColumnSpec>,
}

impl SchemaVariant {
    /// Resolve the column table against a header row
    ///
    /// # Errors
    /// Returns [`SchemaMismatch`] listing every required column that is absent
    pub fn resolve(&self, table: &Table, path: &Path) -> Result<ColumnMap, SchemaMismatch> {
        let mut columns = BTreeMap::new();
        let mut missing = Vec::new();

        for spec in &self.columns {
            match spec.locate(table) {
                Some((index, unit)) => {
                    columns.insert(spec.field, ResolvedColumn { index, unit });
                }
                None if spec.field.is_required() => {
                    if let Some(header) = spec.primary_header() {
                        missing.push(header.to_string());
                    }
                }
                None => {}
            }
        }

        if missing.is_empty() {
            Ok(ColumnMap { columns })
        } else {
            Err(SchemaMismatch {
                tool: self.tool,
                path: path.to_path_buf(),
                sheet: self.sheet.to_string(),
                missing,
            })
        }
    }
}

/// Column position and unit found in a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Zero-based column index
    pub index: usize,
    /// Unit of the matched header
    pub unit: Unit,
}

static EMPTY: Cell = Cell::Empty;

/// Resolved field to column mapping for one sheet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMap {
    columns: BTreeMap<Field, ResolvedColumn>,
}

impl ColumnMap {
    /// True when the sheet has a column for `field`
    #[inline]
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// Resolved column for `field`
    #[inline]
    #[must_use]
    pub fn get(&self, field: Field) -> Option<ResolvedColumn> {
        self.columns.get(&field).copied()
    }

    /// Cell for `field`; blank when the column or the cell is absent
    #[must_use]
    pub fn cell<'a>(&self, row: &'a [Cell], field: Field) -> &'a Cell {
        self.columns
            .get(&field)
            .and_then(|column| row.get(column.index))
            .unwrap_or(&EMPTY)
    }

    /// Numeric cell converted to GiB with the column's unit
    #[must_use]
    pub fn gib(&self, row: &[Cell], field: Field) -> Option<f64> {
        let column = self.columns.get(&field)?;
        let value = crate::coerce::number(row.get(column.index)?)?;
        Some(column.unit.to_gib(value))
    }
}

fn rvtools_variant(
    version: &'static str,
    unit: Unit,
    provisioned: &'static str,
    used: &'static str,
) -> SchemaVariant {
    SchemaVariant {
        tool: SourceTool::RvTools,
        version,
        sheet: "vInfo",
        probe: provisioned,
        columns: vec![
            ColumnSpec::plain(Field::Id, "VM ID"),
            ColumnSpec::plain(Field::Name, "VM"),
            ColumnSpec::plain(Field::Cluster, "Cluster"),
            ColumnSpec::plain(Field::Datacenter, "Datacenter"),
            ColumnSpec::plain(Field::PowerState, "Powerstate"),
            ColumnSpec::plain(Field::GuestOs, "OS according to the VMware Tools"),
            ColumnSpec::plain(Field::GuestHostname, "DNS Name"),
            ColumnSpec::plain(Field::Ip(1), "Primary IP Address"),
            ColumnSpec::plain(Field::Vcpu, "CPUs"),
            ColumnSpec::in_unit(Field::Memory, "Memory", unit),
            ColumnSpec::in_unit(Field::ProvisionedStorage, provisioned, unit),
            ColumnSpec::in_unit(Field::UsedStorage, used, unit),
            ColumnSpec::plain(Field::Folder, "Folder"),
            ColumnSpec::plain(Field::ResourcePool, "Resource pool"),
        ],
    }
}

fn liveoptics_variant(version: &'static str, unit: Unit, memory: &'static str) -> SchemaVariant {
    SchemaVariant {
        tool: SourceTool::LiveOptics,
        version,
        sheet: "VMs",
        probe: memory,
        columns: vec![
            ColumnSpec::plain(Field::Id, "MOB ID"),
            ColumnSpec::plain(Field::Name, "VM Name"),
            ColumnSpec::plain(Field::Cluster, "Cluster"),
            ColumnSpec::plain(Field::Datacenter, "Datacenter"),
            ColumnSpec::plain(Field::PowerState, "Power State"),
            ColumnSpec::plain(Field::GuestOs, "VM OS"),
            ColumnSpec::plain(Field::GuestHostname, "Guest Hostname"),
            ColumnSpec::plain(Field::Ip(1), "Guest IP1"),
            ColumnSpec::plain(Field::Ip(2), "Guest IP2"),
            ColumnSpec::plain(Field::Ip(3), "Guest IP3"),
            ColumnSpec::plain(Field::Ip(4), "Guest IP4"),
            ColumnSpec::plain(Field::Vcpu, "Virtual CPU"),
            ColumnSpec::in_unit(Field::Memory, memory, unit),
            ColumnSpec::any_of(Field::ProvisionedStorage, &DISK_SIZE_HEADERS, unit),
            ColumnSpec::any_of(Field::UsedStorage, &DISK_USED_HEADERS, unit),
        ],
    }
}

/// Registered layouts, tried in registration order
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    variants: Vec<SchemaVariant>,
}

impl SchemaRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            variants: Vec::new(),
        }
    }

    /// Create registry with the built-in RVTools and LiveOptics layouts
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(rvtools_variant("4.x", Unit::Mib, "Provisioned MiB", "In Use MiB"));
        registry.register(rvtools_variant("3.x", Unit::Mib, "Provisioned MB", "In Use MB"));
        registry.register(liveoptics_variant("mb", Unit::Mib, "Provisioned Memory (MB)"));
        registry.register(liveoptics_variant("bytes", Unit::Bytes, "Provisioned Memory (Bytes)"));
        registry
    }

    /// Register a layout
    pub fn register(&mut self, variant: SchemaVariant) {
        self.variants.push(variant);
    }

    /// Layouts for one tool, in registration order
    pub fn variants_for(&self, tool: SourceTool) -> impl Iterator<Item = &SchemaVariant> {
        self.variants.iter().filter(move |v| v.tool == tool)
    }

    /// Distinct main sheets for a tool, in registration order
    #[must_use]
    pub fn sheets_for(&self, tool: SourceTool) -> Vec<&'static str> {
        let mut sheets: Vec<&'static str> = Vec::new();
        for variant in self.variants_for(tool) {
            if !sheets.contains(&variant.sheet) {
                sheets.push(variant.sheet);
            }
        }
        sheets
    }

    /// Probe headers for a tool and sheet
    #[must_use]
    pub fn probes_for(&self, tool: SourceTool, sheet: &str) -> Vec<String> {
        self.variants_for(tool)
            .filter(|v| v.sheet == sheet)
            .map(|v| v.probe.to_string())
            .collect()
    }

    /// First layout of `tool` on `sheet` whose probe header is present
    #[must_use]
    pub fn detect(&self, tool: SourceTool, sheet: &str, table: &Table) -> Option<&SchemaVariant> {
        self.variants_for(tool)
            .filter(|v| v.sheet == sheet)
            .find(|v| table.has_column(v.probe))
    }

    /// Number of registered layouts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
