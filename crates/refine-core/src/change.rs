//! Applyable/revertible mutation artifacts
//!
//! A `Change` is the only thing that mutates a project. Operations compute a
//! full change first; `apply` is invoked only once computation succeeded, so
//! failures never leave a project half-mutated.

use crate::error::{Error, Result};
use crate::table::{Project, Row};

/// A mutation artifact that can transform a project forward and undo that
/// transformation exactly.
pub trait Change: std::fmt::Debug {
    /// Capture the current state needed for revert, then install the change.
    /// Must run to completion once started.
    fn apply(&mut self, project: &mut Project) -> Result<()>;

    /// Restore the state captured by the preceding `apply`, exactly
    fn revert(&mut self, project: &mut Project) -> Result<()>;
}

/// Whole-row replacement: a new ordered row sequence replaces the project's
/// rows. Revert restores the captured previous sequence, including recon
/// contents, even when the row counts differ.
#[derive(Debug, Clone)]
pub struct MassRowChange {
    new_rows: Vec<Row>,
    old_rows: Option<Vec<Row>>,
}

impl MassRowChange {
    /// Create a change that will install the given row sequence
    pub fn new(new_rows: Vec<Row>) -> Self {
        Self {
            new_rows,
            old_rows: None,
        }
    }

    /// The row sequence this change installs
    pub fn new_rows(&self) -> &[Row] {
        &self.new_rows
    }
}

impl Change for MassRowChange {
    fn apply(&mut self, project: &mut Project) -> Result<()> {
        // keep new_rows intact so the same change can be re-applied on redo
        let before = std::mem::replace(&mut project.rows, self.new_rows.clone());
        self.old_rows = Some(before);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<()> {
        let before = self.old_rows.take().ok_or(Error::NothingToRevert)?;
        project.rows = before;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recon::{Judgment, Recon};
    use crate::table::tests::{project_of, row_of};
    use crate::table::{Cell, CellValue};

    #[test]
    fn test_apply_then_revert_is_exact() {
        let mut project = project_of(&["A"], &[&["x"], &["y"]]);
        let recon = Recon::new(Judgment::Matched);
        project.rows[0].set_cell(
            0,
            Some(Cell::with_recon(CellValue::String("x".to_string()), recon)),
        );
        let original = project.rows.clone();

        let mut change = MassRowChange::new(vec![row_of(&["z"])]);
        change.apply(&mut project).unwrap();
        assert_eq!(project.row_count(), 1);

        change.revert(&mut project).unwrap();
        assert_eq!(project.rows, original);
        assert!(project.rows[0].cell(0).unwrap().recon.is_some());
    }

    #[test]
    fn test_revert_restores_original_row_count() {
        let mut project = project_of(&["A"], &[&["a"], &["b"], &["c"]]);

        let mut change = MassRowChange::new(vec![row_of(&["merged"])]);
        change.apply(&mut project).unwrap();
        assert_eq!(project.row_count(), 1);

        change.revert(&mut project).unwrap();
        assert_eq!(project.row_count(), 3);
    }

    #[test]
    fn test_reapply_after_revert() {
        let mut project = project_of(&["A"], &[&["a"]]);
        let mut change = MassRowChange::new(vec![row_of(&["b"])]);

        change.apply(&mut project).unwrap();
        change.revert(&mut project).unwrap();
        change.apply(&mut project).unwrap();
        assert_eq!(
            project.rows[0].cell_value(0),
            Some(&CellValue::String("b".to_string()))
        );
    }

    #[test]
    fn test_revert_before_apply_is_an_error() {
        let mut project = project_of(&["A"], &[&["a"]]);
        let mut change = MassRowChange::new(vec![]);
        assert!(matches!(
            change.revert(&mut project),
            Err(Error::NothingToRevert)
        ));
        // project untouched
        assert_eq!(project.row_count(), 1);
    }
}
