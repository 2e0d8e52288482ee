use crate::graph::node::NodeId;
use thiserror::Error;

/// Custom error type for the nanograd engine.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum NanogradError {
    #[error("Node {id} not found in the computation graph")]
    NodeNotFound { id: NodeId },

    #[error("Operation {op} expects {expected} operands, got {actual}")]
    ArityMismatch {
        op: String,
        expected: usize,
        actual: usize,
    },

    #[error("Input width mismatch: module expects {expected} inputs, got {actual}")]
    InputWidthMismatch { expected: usize, actual: usize },

    #[error("Cannot build a network with no layers")]
    EmptyNetwork,
}
