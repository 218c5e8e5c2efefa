//! Joining multi-valued cells spread across a record's continuation rows

use crate::change::{Change, MassRowChange};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::table::{records, Cell, CellValue, Project};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Collapses each multi-row record into its first row by concatenating the
/// non-blank values of the target column, joined by a separator. Rows that
/// become entirely blank are dropped. Not idempotent: re-running after the
/// merge produces a different, smaller grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiValuedCellJoinOperation {
    op: String,
    description: String,
    column_name: String,
    key_column_name: String,
    separator: String,
}

impl MultiValuedCellJoinOperation {
    /// Registry key for this operation kind
    pub const OP_KIND: &'static str = "core/multivalued-cell-join";

    /// Create a join of the values in `column_name`, grouping rows into
    /// records by blank-key continuation on `key_column_name`.
    pub fn new(
        column_name: impl Into<String>,
        key_column_name: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        let column_name = column_name.into();
        let description = brief(&column_name);
        Self {
            op: Self::OP_KIND.to_string(),
            description,
            column_name,
            key_column_name: key_column_name.into(),
            separator: separator.into(),
        }
    }

    /// Decode from a persisted operation record
    pub fn decode(value: &Value) -> Result<Box<dyn Operation>> {
        Ok(Box::new(serde_json::from_value::<Self>(value.clone())?))
    }
}

fn brief(column_name: &str) -> String {
    format!("Join multi-valued cells in column {}", column_name)
}

impl Operation for MultiValuedCellJoinOperation {
    fn op_kind(&self) -> &'static str {
        Self::OP_KIND
    }

    fn validate(&self) -> Result<()> {
        if self.column_name.is_empty() {
            return Err(Error::MissingParameter("column name".to_string()));
        }
        if self.key_column_name.is_empty() {
            return Err(Error::MissingParameter("key column name".to_string()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        brief(&self.column_name)
    }

    fn create_change(&self, project: &Project) -> Result<Box<dyn Change>> {
        let column = project
            .column_by_name(&self.column_name)
            .ok_or_else(|| Error::ColumnNotFound(self.column_name.clone()))?;
        let cell_index = column.cell_index;

        let key_column = project
            .column_by_name(&self.key_column_name)
            .ok_or_else(|| Error::ColumnNotFound(self.key_column_name.clone()))?;
        let key_cell_index = key_column.cell_index;

        let mut new_rows = Vec::with_capacity(project.rows.len());
        for record in records(&project.rows, key_cell_index) {
            // single-row records pass through unchanged
            if record.to - record.from == 1 {
                new_rows.push(project.rows[record.from].dup());
                continue;
            }

            let mut joined = String::new();
            for r in record.row_indices() {
                if let Some(value) = project.rows[r].cell_value(cell_index) {
                    if !value.is_blank() {
                        if !joined.is_empty() {
                            joined.push_str(&self.separator);
                        }
                        joined.push_str(&value.to_string_value());
                    }
                }
            }

            for r in record.row_indices() {
                let mut new_row = project.rows[r].dup();
                if r == record.from {
                    // any prior recon on the joined cell is discarded
                    new_row.set_cell(cell_index, Some(Cell::new(CellValue::String(joined.clone()))));
                } else {
                    new_row.set_cell(cell_index, None);
                }
                if !new_row.is_empty() {
                    new_rows.push(new_row);
                }
            }
        }

        Ok(Box::new(MassRowChange::new(new_rows)))
    }

    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
