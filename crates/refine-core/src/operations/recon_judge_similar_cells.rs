//! Applying one reconciliation judgment to every cell with a matching value

use crate::change::{Change, MassRowChange};
use crate::engine::{self, EngineConfig};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::recon::{fresh_recon_id, Judgment, Recon, ReconConfig};
use crate::table::{Cell, Project};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Finds every in-scope cell in a column whose display value equals
/// `similar_value` and attaches a new recon carrying `judgment`.
///
/// With judgment `new` and `share_new_topics` set, all matches receive the
/// same freshly allocated identifier and a batch size equal to the match
/// count; otherwise each match gets an independent identifier. The
/// identifier is allocated once per operation invocation, never per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconJudgeSimilarCellsOperation {
    op: String,
    description: String,
    engine_config: EngineConfig,
    column_name: String,
    similar_value: String,
    judgment: Judgment,
    share_new_topics: bool,
}

impl ReconJudgeSimilarCellsOperation {
    /// Registry key for this operation kind
    pub const OP_KIND: &'static str = "core/recon-judge-similar-cells";

    /// Create a judgment operation over cells matching `similar_value`
    pub fn new(
        engine_config: EngineConfig,
        column_name: impl Into<String>,
        similar_value: impl Into<String>,
        judgment: Judgment,
        share_new_topics: bool,
    ) -> Self {
        let column_name = column_name.into();
        let similar_value = similar_value.into();
        let description = brief(&column_name, &similar_value, judgment, share_new_topics);
        Self {
            op: Self::OP_KIND.to_string(),
            description,
            engine_config,
            column_name,
            similar_value,
            judgment,
            share_new_topics,
        }
    }

    /// Decode from a persisted operation record
    pub fn decode(value: &Value) -> Result<Box<dyn Operation>> {
        Ok(Box::new(serde_json::from_value::<Self>(value.clone())?))
    }

    fn make_recon(&self, config: Option<&ReconConfig>, shared: Option<(i64, usize)>) -> Recon {
        let (id, batch_size) = shared.unwrap_or_else(|| (fresh_recon_id(), 1));
        Recon {
            id,
            judgment: self.judgment,
            service: config.map(|c| c.service.clone()),
            identifier_space: config.map(|c| c.identifier_space.clone()),
            schema_space: config.map(|c| c.schema_space.clone()),
            batch_size,
        }
    }
}

fn brief(column_name: &str, similar_value: &str, judgment: Judgment, share: bool) -> String {
    match (judgment, share) {
        (Judgment::New, true) => format!(
            "Mark to create one single new item for all cells containing \"{}\" in column {}",
            similar_value, column_name
        ),
        (Judgment::New, false) => format!(
            "Mark to create one new item for each cell containing \"{}\" in column {}",
            similar_value, column_name
        ),
        (Judgment::Matched, _) => format!(
            "Match all cells containing \"{}\" in column {}",
            similar_value, column_name
        ),
        (Judgment::None, _) => format!(
            "Discard recon judgments for all cells containing \"{}\" in column {}",
            similar_value, column_name
        ),
    }
}

impl Operation for ReconJudgeSimilarCellsOperation {
    fn op_kind(&self) -> &'static str {
        Self::OP_KIND
    }

    fn validate(&self) -> Result<()> {
        if self.column_name.is_empty() {
            return Err(Error::MissingParameter("column name".to_string()));
        }
        if self.similar_value.is_empty() {
            return Err(Error::MissingParameter("similar value".to_string()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        brief(
            &self.column_name,
            &self.similar_value,
            self.judgment,
            self.share_new_topics,
        )
    }

    fn create_change(&self, project: &Project) -> Result<Box<dyn Change>> {
        let column = project
            .column_by_name(&self.column_name)
            .ok_or_else(|| Error::ColumnNotFound(self.column_name.clone()))?;
        let cell_index = column.cell_index;
        let recon_config = column.recon_config.as_ref();

        let selected: HashSet<usize> = engine::select(project, &self.engine_config)?
            .into_iter()
            .collect();

        // first pass: find the matching cells, so a shared identifier and
        // batch count can be fixed before any recon is built
        let matches: HashSet<usize> = project
            .rows
            .iter()
            .enumerate()
            .filter(|(r, row)| {
                selected.contains(r)
                    && row.cell(cell_index).is_some_and(|c| {
                        !c.is_blank() && c.value.to_string_value() == self.similar_value
                    })
            })
            .map(|(r, _)| r)
            .collect();

        let shared = if self.judgment == Judgment::New && self.share_new_topics {
            Some((fresh_recon_id(), matches.len()))
        } else {
            None
        };

        let mut new_rows = Vec::with_capacity(project.rows.len());
        for (r, row) in project.rows.iter().enumerate() {
            if !matches.contains(&r) {
                // untouched cells keep their existing recon by identity
                new_rows.push(row.dup());
                continue;
            }
            let value = row
                .cell(cell_index)
                .map(|c| c.value.clone())
                .expect("matching row has a cell");
            let mut new_row = row.dup();
            new_row.set_cell(
                cell_index,
                Some(Cell::with_recon(value, self.make_recon(recon_config, shared))),
            );
            new_rows.push(new_row);
        }

        Ok(Box::new(MassRowChange::new(new_rows)))
    }

    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::project_of;
    use crate::table::CellValue;

    fn apply(project: &mut Project, op: &ReconJudgeSimilarCellsOperation) {
        let mut change = op.create_change(project).unwrap();
        change.apply(project).unwrap();
    }

    fn fixture() -> Project {
        project_of(
            &["A", "B"],
            &[&["foo", "1"], &["other", "2"], &["foo", "3"]],
        )
    }

    #[test]
    fn test_shared_identifier_propagation() {
        let mut project = fixture();
        let op = ReconJudgeSimilarCellsOperation::new(
            EngineConfig::row_based(),
            "A",
            "foo",
            Judgment::New,
            true,
        );
        apply(&mut project, &op);

        let recon0 = project.rows[0].cell(0).unwrap().recon.clone().unwrap();
        let recon2 = project.rows[2].cell(0).unwrap().recon.clone().unwrap();
        assert_eq!(recon0.judgment, Judgment::New);
        assert_eq!(recon0.id, recon2.id);
        assert_eq!(recon0.batch_size, 2);
        assert_eq!(recon2.batch_size, 2);
        assert!(project.rows[1].cell(0).unwrap().recon.is_none());
    }

    #[test]
    fn test_unshared_new_topics_get_independent_identifiers() {
        let mut project = fixture();
        let op = ReconJudgeSimilarCellsOperation::new(
            EngineConfig::row_based(),
            "A",
            "foo",
            Judgment::New,
            false,
        );
        apply(&mut project, &op);

        let recon0 = project.rows[0].cell(0).unwrap().recon.clone().unwrap();
        let recon2 = project.rows[2].cell(0).unwrap().recon.clone().unwrap();
        assert_ne!(recon0.id, recon2.id);
        assert_eq!(recon0.batch_size, 1);
        assert_eq!(recon2.batch_size, 1);
    }

    #[test]
    fn test_recon_inherits_column_config() {
        let mut project = fixture();
        project.column_by_name_mut("A").unwrap().recon_config = Some(ReconConfig {
            service: "http://my.database/recon_service".to_string(),
            identifier_space: "http://my.database/entity/".to_string(),
            schema_space: "http://my.database/schema/".to_string(),
        });

        let op = ReconJudgeSimilarCellsOperation::new(
            EngineConfig::row_based(),
            "A",
            "foo",
            Judgment::New,
            true,
        );
        apply(&mut project, &op);

        let recon = project.rows[0].cell(0).unwrap().recon.clone().unwrap();
        assert_eq!(
            recon.identifier_space.as_deref(),
            Some("http://my.database/entity/")
        );
        assert_eq!(
            recon.service.as_deref(),
            Some("http://my.database/recon_service")
        );
    }

    #[test]
    fn test_cells_outside_scope_are_untouched() {
        let mut project = fixture();
        // scope down to rows whose B column contains "1"
        let op = ReconJudgeSimilarCellsOperation::new(
            EngineConfig {
                mode: crate::engine::EngineMode::RowBased,
                facets: vec![crate::engine::Facet::Text {
                    column_name: "B".to_string(),
                    query: "1".to_string(),
                }],
            },
            "A",
            "foo",
            Judgment::New,
            true,
        );
        apply(&mut project, &op);

        let recon0 = project.rows[0].cell(0).unwrap().recon.clone().unwrap();
        assert_eq!(recon0.batch_size, 1);
        // row 2 matches the value but not the scope
        assert!(project.rows[2].cell(0).unwrap().recon.is_none());
    }

    #[test]
    fn test_matched_judgment_and_preserved_values() {
        let mut project = fixture();
        let op = ReconJudgeSimilarCellsOperation::new(
            EngineConfig::row_based(),
            "A",
            "foo",
            Judgment::Matched,
            false,
        );
        apply(&mut project, &op);

        let cell = project.rows[0].cell(0).unwrap();
        assert_eq!(cell.value, CellValue::String("foo".to_string()));
        assert_eq!(cell.recon.as_ref().unwrap().judgment, Judgment::Matched);
    }

    #[test]
    fn test_validate_rejects_missing_parameters() {
        let op = ReconJudgeSimilarCellsOperation::new(
            EngineConfig::row_based(),
            "",
            "foo",
            Judgment::New,
            true,
        );
        assert!(matches!(op.validate(), Err(Error::MissingParameter(_))));

        let op = ReconJudgeSimilarCellsOperation::new(
            EngineConfig::row_based(),
            "A",
            "",
            Judgment::New,
            true,
        );
        assert!(matches!(op.validate(), Err(Error::MissingParameter(_))));
    }

    #[test]
    fn test_serialization_round_trip() {
        let json = "{\"op\":\"core/recon-judge-similar-cells\",\
                     \"description\":\"Mark to create one single new item for all cells containing \\\"foo\\\" in column A\",\
                     \"engineConfig\":{\"mode\":\"row-based\",\"facets\":[]},\
                     \"columnName\":\"A\",\
                     \"similarValue\":\"foo\",\
                     \"judgment\":\"new\",\
                     \"shareNewTopics\":true}";
        let op: ReconJudgeSimilarCellsOperation = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&op).unwrap(), json);
        assert_eq!(
            op,
            ReconJudgeSimilarCellsOperation::new(
                EngineConfig::row_based(),
                "A",
                "foo",
                Judgment::New,
                true,
            )
        );
    }
}
