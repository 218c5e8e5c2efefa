//! Built-in transformation operations

mod multivalued_cell_join;
mod recon_judge_similar_cells;
mod text_transform;

pub use multivalued_cell_join::MultiValuedCellJoinOperation;
pub use recon_judge_similar_cells::ReconJudgeSimilarCellsOperation;
pub use text_transform::{OnError, TextTransformOperation};

use crate::operation::OperationRegistry;

/// Register the core operation kinds in a registry
pub(crate) fn register_core_operations(registry: &mut OperationRegistry) {
    registry.register(
        TextTransformOperation::OP_KIND,
        TextTransformOperation::decode,
    );
    registry.register(
        MultiValuedCellJoinOperation::OP_KIND,
        MultiValuedCellJoinOperation::decode,
    );
    registry.register(
        ReconJudgeSimilarCellsOperation::OP_KIND,
        ReconJudgeSimilarCellsOperation::decode,
    );
}
