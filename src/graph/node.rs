use std::sync::atomic::{AtomicUsize, Ordering};

use super::op::Operator;

// Unique ID generator for computational graph nodes.
static NODE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Identity of a value in the computation graph.
///
/// The backward pass keys its visited set on node identity, not on payload
/// equality, so ids are never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn new() -> Self {
        // `Ordering::Relaxed` is sufficient here: the counter only has to
        // hand out distinct values, no other memory is synchronized on it.
        let id = NODE_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A scalar value in the computation graph.
///
/// A node is either a leaf (a caller input or a module parameter) or the
/// output of an operation, in which case it owns the record of the operation
/// that produced it together with back-references to its operands. Once a
/// node is built its `op` and `inputs` are never rewired.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub op: Option<Box<dyn Operator>>,
    pub inputs: Vec<NodeId>,
    pub data: f64,
    pub requires_grad: bool,
}

impl Node {
    /// Creates a new leaf node.
    pub fn new_leaf(data: f64, requires_grad: bool) -> Self {
        Self {
            id: NodeId::new(),
            op: None,
            inputs: Vec::new(),
            data,
            requires_grad,
        }
    }

    /// Creates a new node as the output of an operation.
    pub fn from_op(op: Box<dyn Operator>, inputs: Vec<NodeId>, data: f64) -> Self {
        Self {
            id: NodeId::new(),
            op: Some(op),
            inputs,
            data,
            // Intermediate values always take part in the backward pass.
            requires_grad: true,
        }
    }

    /// Check if this is a leaf node (no producing operation).
    pub fn is_leaf(&self) -> bool {
        self.op.is_none()
    }
}
