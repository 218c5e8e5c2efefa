//! Undo/redo history for applied operations
//!
//! Each project has one history: an ordered past of applied entries and a
//! future of undone entries. Entry ids are strictly increasing and never
//! reused, even across undo/redo cycles.

use crate::change::Change;
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::table::Project;
use chrono::{DateTime, Utc};

/// An immutable record of one successfully applied operation
#[derive(Debug)]
pub struct HistoryEntry {
    /// Monotonically increasing id, unique within the history
    pub id: u64,
    /// Human-readable description, captured at apply time
    pub description: String,
    /// When the operation was applied
    pub timestamp: DateTime<Utc>,
    /// The operation that produced this entry
    pub operation: Box<dyn Operation>,
    /// The change the operation produced
    pub change: Box<dyn Change>,
}

/// Ordered undo/redo stacks of history entries for one project.
///
/// The surrounding service must serialize `apply`/`undo`/`redo` calls per
/// project; the history provides no internal locking.
#[derive(Debug)]
pub struct History {
    past: Vec<HistoryEntry>,
    future: Vec<HistoryEntry>,
    next_id: u64,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            next_id: 1,
        }
    }

    /// Validate an operation, compute its change, install it, and record the
    /// entry, returning its id. On any failure the project is left
    /// unmodified. Applying a new operation invalidates the redo (future)
    /// stack.
    pub fn apply(&mut self, project: &mut Project, operation: Box<dyn Operation>) -> Result<u64> {
        operation.validate()?;
        let mut change = operation.create_change(project)?;
        change.apply(project)?;

        let id = self.next_id;
        self.next_id += 1;

        self.past.push(HistoryEntry {
            id,
            description: operation.describe(),
            timestamp: Utc::now(),
            operation,
            change,
        });
        self.future.clear();
        Ok(id)
    }

    /// Revert the most recent entry and move it to the future stack
    pub fn undo(&mut self, project: &mut Project) -> Result<u64> {
        let mut entry = self.past.pop().ok_or(Error::EmptyHistory("undo"))?;
        match entry.change.revert(project) {
            Ok(()) => {
                let id = entry.id;
                self.future.push(entry);
                Ok(id)
            }
            Err(e) => {
                self.past.push(entry);
                Err(e)
            }
        }
    }

    /// Re-apply the most recently undone entry's recorded change.
    ///
    /// The stored change is re-applied rather than recomputed, so redo does
    /// not re-run row selection against a dataset whose shape may have
    /// changed in the interim.
    pub fn redo(&mut self, project: &mut Project) -> Result<u64> {
        let mut entry = self.future.pop().ok_or(Error::EmptyHistory("redo"))?;
        match entry.change.apply(project) {
            Ok(()) => {
                let id = entry.id;
                self.past.push(entry);
                Ok(id)
            }
            Err(e) => {
                self.future.push(entry);
                Err(e)
            }
        }
    }

    /// Re-run a recorded operation sequence against a freshly loaded project
    /// to reconstruct its state. Stops at the first failing operation.
    pub fn replay(
        &mut self,
        project: &mut Project,
        operations: Vec<Box<dyn Operation>>,
    ) -> Result<Vec<u64>> {
        let mut ids = Vec::with_capacity(operations.len());
        for operation in operations {
            ids.push(self.apply(project, operation)?);
        }
        Ok(ids)
    }

    /// Applied entries, oldest first
    pub fn past_entries(&self) -> &[HistoryEntry] {
        &self.past
    }

    /// Undone entries available for redo
    pub fn future_entries(&self) -> &[HistoryEntry] {
        &self.future
    }

    /// The most recently applied entry, if any
    pub fn last_past_entry(&self) -> Option<&HistoryEntry> {
        self.past.last()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
