//! Core tabular types: cells, rows, columns, projects, and derived records

use crate::recon::{Recon, ReconConfig};
use serde::{Deserialize, Serialize};

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// A stored per-cell evaluation error
    Error(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }

        CellValue::String(trimmed.to_string())
    }

    /// Check if the value carries no data (empty, or a blank string)
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

/// A cell: an immutable value plus an optional reconciliation result.
///
/// Cells are replaced wholesale, never mutated in place, so old instances
/// stay valid inside captured undo state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// The cell value
    pub value: CellValue,
    /// Reconciliation result, if any
    pub recon: Option<Recon>,
}

impl Cell {
    /// Create a cell with no recon
    pub fn new(value: CellValue) -> Self {
        Self { value, recon: None }
    }

    /// Create a cell with a recon attached
    pub fn with_recon(value: CellValue, recon: Recon) -> Self {
        Self {
            value,
            recon: Some(recon),
        }
    }

    /// Check if the cell carries no data
    pub fn is_blank(&self) -> bool {
        self.value.is_blank()
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within a project)
    pub name: String,
    /// Stable slot index into every row's cell list; never changes once assigned
    pub cell_index: usize,
    /// Reconciliation configuration, if the column has been reconciled
    pub recon_config: Option<ReconConfig>,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, cell_index: usize) -> Self {
        Self {
            name: name.into(),
            cell_index,
            recon_config: None,
        }
    }
}

/// A row of cell slots plus row-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Cell slots, one per cell index; `None` means the slot holds no cell
    pub cells: Vec<Option<Cell>>,
    /// Starred flag
    pub starred: bool,
    /// Flagged flag
    pub flagged: bool,
}

impl Row {
    /// Create a new row from cell slots
    pub fn new(cells: Vec<Option<Cell>>) -> Self {
        Self {
            cells,
            starred: false,
            flagged: false,
        }
    }

    /// Non-mutating duplicate, preserving cell and recon contents
    pub fn dup(&self) -> Row {
        self.clone()
    }

    /// Get the cell at a slot index
    pub fn cell(&self, cell_index: usize) -> Option<&Cell> {
        self.cells.get(cell_index).and_then(|c| c.as_ref())
    }

    /// Get the value at a slot index
    pub fn cell_value(&self, cell_index: usize) -> Option<&CellValue> {
        self.cell(cell_index).map(|c| &c.value)
    }

    /// Replace the cell at a slot index, growing the slot list if needed
    pub fn set_cell(&mut self, cell_index: usize, cell: Option<Cell>) {
        if self.cells.len() <= cell_index {
            self.cells.resize(cell_index + 1, None);
        }
        self.cells[cell_index] = cell;
    }

    /// True if the slot is absent or holds no data
    pub fn is_cell_blank(&self, cell_index: usize) -> bool {
        self.cell(cell_index).map_or(true, |c| c.is_blank())
    }

    /// True if every slot in the row is blank
    pub fn is_empty(&self) -> bool {
        (0..self.cells.len()).all(|i| self.is_cell_blank(i))
    }
}

/// A derived group of consecutive rows forming one logical multi-row record.
///
/// The row at `from` has a non-blank key cell; rows in `from+1..to` have a
/// blank key cell and continue the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Index of the record's first row
    pub from: usize,
    /// One past the record's last row
    pub to: usize,
}

impl Record {
    /// Row indices belonging to this record
    pub fn row_indices(&self) -> std::ops::Range<usize> {
        self.from..self.to
    }
}

/// Derive record boundaries from the current row order and a key cell index.
///
/// Rows before the first non-blank key stand alone as single-row records.
/// Boundaries are recomputed on demand and must never be cached across a
/// mutation.
pub fn records(rows: &[Row], key_cell_index: usize) -> Vec<Record> {
    let mut result = Vec::new();
    let mut r = 0;
    while r < rows.len() {
        if rows[r].is_cell_blank(key_cell_index) {
            // leading continuation row with no record to join
            result.push(Record { from: r, to: r + 1 });
            r += 1;
            continue;
        }
        let mut r2 = r + 1;
        while r2 < rows.len() && rows[r2].is_cell_blank(key_cell_index) {
            r2 += 1;
        }
        result.push(Record { from: r, to: r2 });
        r = r2;
    }
    result
}

/// An in-memory mutable dataset: the column list plus the ordered row sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data, order-significant
    pub rows: Vec<Row>,
}

impl Project {
    /// Create a new empty project
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, assigning it the next cell index
    pub fn add_column(&mut self, name: impl Into<String>) -> crate::error::Result<usize> {
        let name = name.into();
        if self.column_by_name(&name).is_some() {
            return Err(crate::error::Error::DuplicateColumn(name));
        }
        let cell_index = self.columns.len();
        self.columns.push(Column::new(name, cell_index));
        Ok(cell_index)
    }

    /// Find a column by name
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Find a column by name, mutably
    pub fn column_by_name_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
