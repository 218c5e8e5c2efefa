//! Reconciliation results attached to cells
//!
//! A `Recon` is an immutable value; "sharing" an identifier between cells
//! means storing the same identifier value, never aliasing a mutable object.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Reconciliation judgment for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    /// No judgment
    None,
    /// The cell denotes a new entity not yet in the target database
    New,
    /// The cell is matched to an existing entity
    Matched,
}

/// Per-column reconciliation configuration, recorded when a column is reconciled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconConfig {
    /// Reconciliation service endpoint
    pub service: String,
    /// Identifier space of the target database
    pub identifier_space: String,
    /// Schema space of the target database
    pub schema_space: String,
}

/// A reconciliation result. Immutable once attached to a cell; a new
/// judgment means a new `Recon`, not a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recon {
    /// Identifier shared by all cells believed to denote the same entity
    pub id: i64,
    /// The judgment applied to the cell
    pub judgment: Judgment,
    /// Source reconciliation service
    pub service: Option<String>,
    /// Identifier space the id lives in
    pub identifier_space: Option<String>,
    /// Schema space of the target database
    pub schema_space: Option<String>,
    /// How many cells received this identifier in the same operation
    pub batch_size: usize,
}

static NEXT_RECON_ID: AtomicI64 = AtomicI64::new(1);

/// Allocate a fresh recon identifier, unique within this process
pub fn fresh_recon_id() -> i64 {
    NEXT_RECON_ID.fetch_add(1, Ordering::Relaxed)
}

impl Recon {
    /// Create a recon with a freshly allocated identifier and batch size 1
    pub fn new(judgment: Judgment) -> Self {
        Self {
            id: fresh_recon_id(),
            judgment,
            service: None,
            identifier_space: None,
            schema_space: None,
            batch_size: 1,
        }
    }

    /// Create a recon inheriting spaces and service from a column's config
    pub fn from_config(judgment: Judgment, config: Option<&ReconConfig>) -> Self {
        let mut recon = Self::new(judgment);
        if let Some(config) = config {
            recon.service = Some(config.service.clone());
            recon.identifier_space = Some(config.identifier_space.clone());
            recon.schema_space = Some(config.schema_space.clone());
        }
        recon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_distinct() {
        let a = fresh_recon_id();
        let b = fresh_recon_id();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_judgment_wire_names() {
        assert_eq!(serde_json::to_string(&Judgment::New).unwrap(), "\"new\"");
        assert_eq!(
            serde_json::to_string(&Judgment::Matched).unwrap(),
            "\"matched\""
        );
        assert_eq!(serde_json::to_string(&Judgment::None).unwrap(), "\"none\"");
        let j: Judgment = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(j, Judgment::New);
    }

    #[test]
    fn test_recon_from_config() {
        let config = ReconConfig {
            service: "http://my.service.com/api".to_string(),
            identifier_space: "http://my.service.com/identifierSpace".to_string(),
            schema_space: "http://my.service.com/schemaSpace".to_string(),
        };
        let recon = Recon::from_config(Judgment::New, Some(&config));
        assert_eq!(recon.judgment, Judgment::New);
        assert_eq!(
            recon.identifier_space.as_deref(),
            Some("http://my.service.com/identifierSpace")
        );
        assert_eq!(recon.batch_size, 1);

        let bare = Recon::from_config(Judgment::None, None);
        assert!(bare.service.is_none());
    }
}
