//! Expression-based cell transform with an optional fixpoint rewrite

use crate::change::{Change, MassRowChange};
use crate::engine::{self, EngineConfig};
use crate::error::{Error, Result};
use crate::expr::{evaluate, CellContext};
use crate::operation::Operation;
use crate::recon::Recon;
use crate::table::{Cell, CellValue, Project};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Hard ceiling on fixpoint rounds per cell
const MAX_REPEAT_COUNT: u32 = 10;

/// What to do with a cell whose expression evaluation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnError {
    /// Blank out the cell
    SetToBlank,
    /// Store the error message as the cell value
    StoreError,
    /// Leave the original value in place
    KeepOriginal,
}

/// Transforms each selected cell in a column by evaluating an expression
/// against its current value. With `repeat` set, the expression is re-applied
/// to its own output until a fixpoint is reached or `repeat_count` rounds
/// have run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTransformOperation {
    op: String,
    description: String,
    engine_config: EngineConfig,
    column_name: String,
    expression: String,
    on_error: OnError,
    repeat: bool,
    repeat_count: u32,
}

impl TextTransformOperation {
    /// Registry key for this operation kind
    pub const OP_KIND: &'static str = "core/text-transform";

    /// Create a text transform. `repeat_count` is clamped to [0, 10].
    pub fn new(
        engine_config: EngineConfig,
        column_name: impl Into<String>,
        expression: impl Into<String>,
        on_error: OnError,
        repeat: bool,
        repeat_count: u32,
    ) -> Self {
        let column_name = column_name.into();
        let expression = expression.into();
        let description = brief(&column_name, &expression);
        Self {
            op: Self::OP_KIND.to_string(),
            description,
            engine_config,
            column_name,
            expression,
            on_error,
            repeat,
            repeat_count: repeat_count.min(MAX_REPEAT_COUNT),
        }
    }

    /// Decode from a persisted operation record
    pub fn decode(value: &Value) -> Result<Box<dyn Operation>> {
        Ok(Box::new(serde_json::from_value::<Self>(value.clone())?))
    }

    /// Evaluate the expression for one cell, honoring repeat and the
    /// on-error policy. Returns the replacement cell slot.
    fn transform_cell(
        &self,
        old_value: &CellValue,
        recon: Option<Recon>,
        row_index: usize,
        cell_index: usize,
    ) -> Option<Cell> {
        let rounds = if self.repeat {
            self.repeat_count.min(MAX_REPEAT_COUNT)
        } else {
            1
        };

        let mut current = old_value.clone();
        for round in 0..rounds {
            let ctx = CellContext {
                value: &current,
                row_index,
                cell_index,
            };
            match evaluate(&self.expression, &ctx) {
                Ok(candidate) => {
                    if candidate == current {
                        // fixpoint reached
                        break;
                    }
                    current = candidate;
                }
                Err(e) => {
                    if round == 0 {
                        return match self.on_error {
                            OnError::SetToBlank => None,
                            OnError::StoreError => Some(Cell {
                                value: CellValue::Error(e.to_string()),
                                recon,
                            }),
                            OnError::KeepOriginal => Some(Cell {
                                value: old_value.clone(),
                                recon,
                            }),
                        };
                    }
                    // keep the last successfully computed value
                    break;
                }
            }
        }
        Some(Cell {
            value: current,
            recon,
        })
    }
}

fn brief(column_name: &str, expression: &str) -> String {
    format!(
        "Text transform on cells in column {} using expression {}",
        column_name, expression
    )
}

impl Operation for TextTransformOperation {
    fn op_kind(&self) -> &'static str {
        Self::OP_KIND
    }

    fn validate(&self) -> Result<()> {
        if self.column_name.is_empty() {
            return Err(Error::MissingParameter("column name".to_string()));
        }
        if self.expression.is_empty() {
            return Err(Error::MissingParameter("expression".to_string()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        brief(&self.column_name, &self.expression)
    }

    fn create_change(&self, project: &Project) -> Result<Box<dyn Change>> {
        let column = project
            .column_by_name(&self.column_name)
            .ok_or_else(|| Error::ColumnNotFound(self.column_name.clone()))?;
        let cell_index = column.cell_index;

        let selected: HashSet<usize> = engine::select(project, &self.engine_config)?
            .into_iter()
            .collect();

        let mut new_rows = Vec::with_capacity(project.rows.len());
        for (r, row) in project.rows.iter().enumerate() {
            if !selected.contains(&r) {
                new_rows.push(row.dup());
                continue;
            }
            let old_cell = row.cell(cell_index);
            let old_value = old_cell.map(|c| c.value.clone()).unwrap_or(CellValue::Empty);
            let recon = old_cell.and_then(|c| c.recon.clone());

            let mut new_row = row.dup();
            new_row.set_cell(cell_index, self.transform_cell(&old_value, recon, r, cell_index));
            new_rows.push(new_row);
        }

        Ok(Box::new(MassRowChange::new(new_rows)))
    }

    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
