//! Workbook access
//!
//! Normalizers read sheets through the [`Workbook`] trait so they can be fed
//! from files on disk ([`CalamineWorkbook`]) or from tables built in memory
//! ([`MemoryWorkbook`]).

use crate::error::IngestionError;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Blank
    #[default]
    Empty,
    /// Text
    Text(String),
    /// Any numeric value
    Number(f64),
    /// Boolean
    Bool(bool),
}

impl Cell {
    /// True for blank cells and whitespace-only text
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Cell {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&Data> for Cell {
    #[allow(clippy::cast_precision_loss)]
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::String(text) => Self::Text(text.clone()),
            Data::Int(n) => Self::Number(*n as f64),
            Data::Float(n) => Self::Number(*n),
            Data::Bool(b) => Self::Bool(*b),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Sheet contents: a header row plus data rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table from headers and rows
    #[must_use]
    pub fn new<H, S>(headers: H, rows: Vec<Vec<Cell>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|h| h.as_ref().trim().to_string())
                .collect(),
            rows,
        }
    }

    /// Treat the first row as the header row
    #[must_use]
    pub fn from_grid(mut grid: Vec<Vec<Cell>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header_row = grid.remove(0);
        let headers: Vec<String> = header_row.iter().map(ToString::to_string).collect();
        Self::new(headers, grid)
    }

    /// Header labels in column order
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Column index for an exact header label
    #[must_use]
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// True when the header row contains `header`
    #[inline]
    #[must_use]
    pub fn has_column(&self, header: &str) -> bool {
        self.column(header).is_some()
    }
}

/// Read access to the sheets of one workbook
pub trait Workbook {
    /// Path used in errors and logs
    fn path(&self) -> &Path;

    /// Names of all sheets
    fn sheet_names(&self) -> Vec<String>;

    /// Read a sheet; `Ok(None)` when the sheet does not exist
    ///
    /// # Errors
    /// Returns [`IngestionError::Unreadable`] if the sheet cannot be decoded
    fn table(&mut self, sheet: &str) -> Result<Option<Table>, IngestionError>;
}

/// Workbook file on disk (xlsx, xlsm, xls, ods)
pub struct CalamineWorkbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl CalamineWorkbook {
    /// Open a workbook, detecting the format from the extension
    ///
    /// # Errors
    /// Returns [`IngestionError::Unreadable`] if the file cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestionError> {
        let path = path.as_ref();
        let sheets =
            open_workbook_auto(path).map_err(|e| IngestionError::unreadable(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }
}

impl fmt::Debug for CalamineWorkbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalamineWorkbook")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Workbook for CalamineWorkbook {
    fn path(&self) -> &Path {
        &self.path
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn table(&mut self, sheet: &str) -> Result<Option<Table>, IngestionError> {
        if !self.sheets.sheet_names().iter().any(|name| name == sheet) {
            return Ok(None);
        }
        let range = self
            .sheets
            .worksheet_range(sheet)
            .map_err(|e| IngestionError::unreadable(&self.path, e))?;
        let grid = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        Ok(Some(Table::from_grid(grid)))
    }
}

/// Workbook held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    path: PathBuf,
    sheets: BTreeMap<String, Table>,
}

impl MemoryWorkbook {
    /// Create an empty workbook labelled with `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheets: BTreeMap::new(),
        }
    }

    /// Add or replace a sheet
    #[must_use]
    pub fn with_sheet(mut self, name: impl Into<String>, table: Table) -> Self {
        self.sheets.insert(name.into(), table);
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn path(&self) -> &Path {
        &self.path
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn table(&mut self, sheet: &str) -> Result<Option<Table>, IngestionError> {
        Ok(self.sheets.get(sheet).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_grid_splits_header_row() {
        let table = Table::from_grid(vec![
            vec![Cell::from(" VM "), Cell::from("CPUs")],
            vec![Cell::from("web01"), Cell::from(2.0)],
        ]);
        assert_eq!(table.headers(), ["VM", "CPUs"]);
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.column("CPUs"), Some(1));
        assert!(!table.has_column("Memory"));
    }

    #[test]
    fn from_empty_grid() {
        let table = Table::from_grid(Vec::new());
        assert!(table.headers().is_empty());
        assert!(table.rows().is_empty());
    }

    #[test]
    fn cell_blankness() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::from("  ").is_blank());
        assert!(!Cell::from(0.0).is_blank());
    }

    #[test]
    fn calamine_data_conversion() {
        assert_eq!(Cell::from(&Data::Int(4)), Cell::Number(4.0));
        assert_eq!(Cell::from(&Data::String("x".into())), Cell::from("x"));
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn memory_workbook_sheets() {
        let mut workbook = MemoryWorkbook::new("inventory.xlsx")
            .with_sheet("vInfo", Table::new(["VM"], Vec::new()));
        assert_eq!(workbook.sheet_names(), vec!["vInfo".to_string()]);
        assert!(workbook.table("vInfo").unwrap().is_some());
        assert!(workbook.table("vDisk").unwrap().is_none());
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = CalamineWorkbook::open("/nonexistent/inventory.xlsx");
        assert!(matches!(result, Err(IngestionError::Unreadable { .. })));
    }
}
