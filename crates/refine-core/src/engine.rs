//! Row-selection engine
//!
//! Resolves a declarative selection configuration (mode plus facet
//! predicates) to the concrete set of row indices an operation acts on.
//! Selection is a pure read of the project.

use crate::error::{Error, Result};
use crate::table::{records, Project, Row};
use serde::{Deserialize, Serialize};

/// Whether units of selection are individual rows or multi-row records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineMode {
    /// Each row is selected independently
    #[serde(rename = "row-based")]
    RowBased,
    /// Whole records are selected; a record is included when any of its
    /// rows passes every facet
    #[serde(rename = "record-based")]
    RecordBased,
}

/// A facet predicate evaluated against a single row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Facet {
    /// Substring match on a column's display value
    #[serde(rename = "text", rename_all = "camelCase")]
    Text {
        /// Column whose values are searched
        column_name: String,
        /// Substring to look for
        query: String,
    },
    /// Selects rows whose cell in the column is blank (or non-blank)
    #[serde(rename = "blank", rename_all = "camelCase")]
    Blank {
        /// Column whose blankness is tested
        column_name: String,
        /// True to select blank cells, false to select non-blank ones
        selected: bool,
    },
}

impl Facet {
    fn column_name(&self) -> &str {
        match self {
            Facet::Text { column_name, .. } => column_name,
            Facet::Blank { column_name, .. } => column_name,
        }
    }

    fn matches(&self, row: &Row, cell_index: usize) -> bool {
        match self {
            Facet::Text { query, .. } => {
                let value = row
                    .cell_value(cell_index)
                    .map(|v| v.to_string_value())
                    .unwrap_or_default();
                value.contains(query.as_str())
            }
            Facet::Blank { selected, .. } => row.is_cell_blank(cell_index) == *selected,
        }
    }
}

/// Row-selection configuration: a mode plus facet predicates combined by AND
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Selection mode
    pub mode: EngineMode,
    /// Facet predicates; an empty list selects everything
    pub facets: Vec<Facet>,
}

impl EngineConfig {
    /// Row-based selection with no facets (selects all rows)
    pub fn row_based() -> Self {
        Self {
            mode: EngineMode::RowBased,
            facets: Vec::new(),
        }
    }

    /// Record-based selection with no facets (selects all records)
    pub fn record_based() -> Self {
        Self {
            mode: EngineMode::RecordBased,
            facets: Vec::new(),
        }
    }
}

/// Evaluate a selection configuration, returning the ordered row indices in
/// scope. In record mode, selected records are expanded to their member
/// rows. Facets referencing unknown columns abort the whole selection.
pub fn select(project: &Project, config: &EngineConfig) -> Result<Vec<usize>> {
    // Resolve facet columns up front so a bad facet yields no partial result
    let mut resolved: Vec<(&Facet, usize)> = Vec::with_capacity(config.facets.len());
    for facet in &config.facets {
        let column = project
            .column_by_name(facet.column_name())
            .ok_or_else(|| Error::ColumnNotFound(facet.column_name().to_string()))?;
        resolved.push((facet, column.cell_index));
    }

    let row_matches = |r: usize| {
        resolved
            .iter()
            .all(|(facet, cell_index)| facet.matches(&project.rows[r], *cell_index))
    };

    match config.mode {
        EngineMode::RowBased => Ok((0..project.rows.len()).filter(|&r| row_matches(r)).collect()),
        EngineMode::RecordBased => {
            // Records are keyed by the first column
            let key_cell_index = match project.columns.first() {
                Some(column) => column.cell_index,
                None => return Ok(Vec::new()),
            };
            let mut selected = Vec::new();
            for record in records(&project.rows, key_cell_index) {
                if record.row_indices().any(|r| row_matches(r)) {
                    selected.extend(record.row_indices());
                }
            }
            Ok(selected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::project_of;

    fn fixture() -> Project {
        project_of(
            &["key", "value"],
            &[
                &["a", "foo"],
                &["", "foobar"],
                &["b", "baz"],
                &["c", ""],
            ],
        )
    }

    #[test]
    fn test_empty_facets_select_all_rows() {
        let project = fixture();
        let selected = select(&project, &EngineConfig::row_based()).unwrap();
        assert_eq!(selected, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_text_facet_filters_rows() {
        let project = fixture();
        let config = EngineConfig {
            mode: EngineMode::RowBased,
            facets: vec![Facet::Text {
                column_name: "value".to_string(),
                query: "foo".to_string(),
            }],
        };
        assert_eq!(select(&project, &config).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_facets_combine_with_and() {
        let project = fixture();
        let config = EngineConfig {
            mode: EngineMode::RowBased,
            facets: vec![
                Facet::Text {
                    column_name: "value".to_string(),
                    query: "foo".to_string(),
                },
                Facet::Blank {
                    column_name: "key".to_string(),
                    selected: true,
                },
            ],
        };
        assert_eq!(select(&project, &config).unwrap(), vec![1]);
    }

    #[test]
    fn test_record_mode_expands_matching_records() {
        let project = fixture();
        let config = EngineConfig {
            mode: EngineMode::RecordBased,
            facets: vec![Facet::Text {
                column_name: "value".to_string(),
                query: "foobar".to_string(),
            }],
        };
        // row 1 matches; it continues the record started at row 0
        assert_eq!(select(&project, &config).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_unknown_facet_column_aborts_selection() {
        let project = fixture();
        let config = EngineConfig {
            mode: EngineMode::RowBased,
            facets: vec![Facet::Text {
                column_name: "nope".to_string(),
                query: "x".to_string(),
            }],
        };
        assert!(matches!(
            select(&project, &config),
            Err(Error::ColumnNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_engine_config_wire_format() {
        let config = EngineConfig::row_based();
        assert_eq!(
            serde_json::to_string(&config).unwrap(),
            "{\"mode\":\"row-based\",\"facets\":[]}"
        );
        let decoded: EngineConfig =
            serde_json::from_str("{\"mode\":\"record-based\",\"facets\":[]}").unwrap();
        assert_eq!(decoded.mode, EngineMode::RecordBased);
    }

    #[test]
    fn test_unknown_facet_type_is_a_decode_error() {
        let result: std::result::Result<Facet, _> =
            serde_json::from_str("{\"type\":\"numeric\",\"columnName\":\"a\"}");
        assert!(result.is_err());
    }
}
