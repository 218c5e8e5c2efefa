//! refine-core: reversible, replayable transformations over tabular projects
//!
//! This library provides:
//! - A tabular model (columns, rows, cells, reconciliation results)
//! - A row-selection engine resolving declarative scope configurations
//! - An operation/change/history framework with undo, redo, and replay
//! - Built-in transformations: expression text transform, multi-valued cell
//!   join, and similar-cell recon judgment
//! - CSV import/export and a JSON persistence format for operations

pub mod change;
pub mod engine;
pub mod error;
pub mod expr;
pub mod history;
pub mod io;
pub mod operation;
pub mod operations;
pub mod recon;
pub mod table;

pub use change::{Change, MassRowChange};
pub use engine::{select, EngineConfig, EngineMode, Facet};
pub use error::{Error, Result};
pub use expr::{evaluate, CellContext, EvalError};
pub use history::{History, HistoryEntry};
pub use io::{export_csv, import_csv, import_csv_str};
pub use operation::{Operation, OperationRegistry};
pub use operations::{
    MultiValuedCellJoinOperation, OnError, ReconJudgeSimilarCellsOperation, TextTransformOperation,
};
pub use recon::{Judgment, Recon, ReconConfig};
pub use table::{records, Cell, CellValue, Column, Project, Record, Row};
