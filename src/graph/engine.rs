use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::error::NanogradError;
use crate::graph::node::{Node, NodeId};
use crate::graph::op::{Add, Div, Exp, Log, Mul, Operator, Pow, ReLU, Sub, Tanh};

/// Main computation graph engine.
///
/// The engine owns every node of the graph, keyed by identity, plus a
/// gradient accumulator per node. A node's gradient is absent until a
/// backward pass first touches it; absence reads as zero. Gradients are
/// written only by [`Engine::backward`] and the explicit
/// [`Engine::set_gradient`] / [`Engine::zero_gradients`] caller surface.
#[derive(Debug)]
pub struct Engine {
    nodes: HashMap<NodeId, Node>,
    gradients: HashMap<NodeId, f64>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            gradients: HashMap::new(),
        }
    }

    /// Creates a new leaf value in the computation graph.
    pub fn create_value(&mut self, data: f64, requires_grad: bool) -> NodeId {
        let node = Node::new_leaf(data, requires_grad);
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Payload of a node, if the node belongs to this engine.
    pub fn get_data(&self, node_id: NodeId) -> Option<f64> {
        self.nodes.get(&node_id).map(|node| node.data)
    }

    /// Accumulated gradient of a node. `None` means no backward pass has
    /// reached the node yet, which reads as zero.
    pub fn get_gradient(&self, node_id: NodeId) -> Option<f64> {
        self.gradients.get(&node_id).copied()
    }

    /// Pre-seeds a node's gradient.
    ///
    /// Seeding the root before calling [`Engine::backward`] lets callers
    /// compose custom loss gradients; the backward pass leaves a non-zero
    /// root gradient untouched.
    pub fn set_gradient(&mut self, node_id: NodeId, grad: f64) {
        self.gradients.insert(node_id, grad);
    }

    /// Clears the accumulated gradient of a single node.
    pub fn clear_gradient(&mut self, node_id: NodeId) {
        self.gradients.remove(&node_id);
    }

    /// Clean up all gradients, e.g. between backward passes.
    pub fn zero_gradients(&mut self) {
        self.gradients.clear();
    }

    pub fn is_leaf(&self, node_id: NodeId) -> bool {
        self.nodes.get(&node_id).is_some_and(|node| node.is_leaf())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn validate_inputs(
        &self,
        op: &Box<dyn Operator>,
        input_ids: &[NodeId],
    ) -> Result<(), NanogradError> {
        for &input_id in input_ids {
            if !self.nodes.contains_key(&input_id) {
                return Err(NanogradError::NodeNotFound { id: input_id });
            }
        }

        if input_ids.len() != op.num_inputs() {
            return Err(NanogradError::ArityMismatch {
                op: op.name(),
                expected: op.num_inputs(),
                actual: input_ids.len(),
            });
        }

        Ok(())
    }

    /// Applies an operation to existing nodes and records the output.
    ///
    /// This is the single chokepoint through which the graph is built: the
    /// output node owns the operation record and back-references to its
    /// operands; the operands themselves are never mutated. Numerical
    /// domain errors (division by zero, log of a non-positive value, a
    /// negative base under a fractional power) follow IEEE 754 semantics
    /// and propagate as NaN/Inf payloads rather than failing the call.
    pub fn apply_operation(
        &mut self,
        op: Box<dyn Operator>,
        input_ids: Vec<NodeId>,
    ) -> Result<NodeId, NanogradError> {
        self.validate_inputs(&op, &input_ids)?;

        let input_data: Vec<f64> = input_ids
            .iter()
            .map(|&input_id| {
                self.get_data(input_id)
                    .ok_or(NanogradError::NodeNotFound { id: input_id })
            })
            .collect::<Result<_, _>>()?;

        let result = op.compute(&input_data)?;

        let node = Node::from_op(op, input_ids, result);
        let id = node.id;
        self.nodes.insert(id, node);
        Ok(id)
    }

    // Graph-builder convenience methods, one per operation.

    /// Builds `a + b`.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Add), vec![a, b])
    }

    /// Builds `a - b`.
    pub fn sub(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Sub), vec![a, b])
    }

    /// Builds `a * b`.
    pub fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Mul), vec![a, b])
    }

    /// Builds `a / b`.
    pub fn div(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Div), vec![a, b])
    }

    /// Builds `base ^ exponent`. The exponent is differentiated as a
    /// constant; see [`Pow`].
    pub fn pow(&mut self, base: NodeId, exponent: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Pow), vec![base, exponent])
    }

    /// Builds `max(0, a)`.
    pub fn relu(&mut self, a: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(ReLU), vec![a])
    }

    /// Builds `tanh(a)`.
    pub fn tanh(&mut self, a: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Tanh), vec![a])
    }

    /// Builds `e ^ a`.
    pub fn exp(&mut self, a: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Exp), vec![a])
    }

    /// Builds `ln(a)`.
    pub fn log(&mut self, a: NodeId) -> Result<NodeId, NanogradError> {
        self.apply_operation(Box::new(Log), vec![a])
    }

    /// Runs the reverse pass from `root`, accumulating gradients into every
    /// node that transitively produced it.
    ///
    /// A leaf root has nothing upstream and the call is a no-op. Otherwise
    /// the root's gradient is seeded to 1.0, unless the caller pre-seeded
    /// it with [`Engine::set_gradient`], in which case the seed is kept.
    /// Gradients of all visited nodes, including the root and interior
    /// nodes, stay readable after the pass. Calling `backward` again
    /// without [`Engine::zero_gradients`] keeps accumulating.
    pub fn backward(&mut self, root: NodeId) -> Result<(), NanogradError> {
        let node = self
            .nodes
            .get(&root)
            .ok_or(NanogradError::NodeNotFound { id: root })?;
        if node.is_leaf() {
            return Ok(());
        }

        // Gradient of a value with respect to itself is 1. A pre-seeded
        // non-zero root gradient is kept so custom loss gradients compose.
        let seed = self.gradients.entry(root).or_insert(0.0);
        if *seed == 0.0 {
            *seed = 1.0;
        }

        let mut visited = HashSet::new();
        let mut topo_order = Vec::new();
        self.topological_sort(root, &mut visited, &mut topo_order)?;
        debug!("backward pass over {} nodes", topo_order.len());

        // Walk the order reversed, root first, distributing each node's
        // accumulated gradient to its operands.
        for &node_id in topo_order.iter().rev() {
            self.backward_node(node_id)?;
        }

        Ok(())
    }

    /// Post-order of every node reachable from `root` through operand
    /// edges: each node appears after all of its operands, the root last.
    pub fn topological_order(&self, root: NodeId) -> Result<Vec<NodeId>, NanogradError> {
        let mut visited = HashSet::new();
        let mut topo_order = Vec::new();
        self.topological_sort(root, &mut visited, &mut topo_order)?;
        Ok(topo_order)
    }

    fn topological_sort(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        topo_order: &mut Vec<NodeId>,
    ) -> Result<(), NanogradError> {
        if visited.contains(&node_id) {
            return Ok(());
        }
        visited.insert(node_id);

        let node = self
            .nodes
            .get(&node_id)
            .ok_or(NanogradError::NodeNotFound { id: node_id })?;
        for &input_id in &node.inputs {
            self.topological_sort(input_id, visited, topo_order)?;
        }

        topo_order.push(node_id);
        Ok(())
    }

    /// Backward step for a single node.
    fn backward_node(&mut self, node_id: NodeId) -> Result<(), NanogradError> {
        // Nodes the gradient flow never reached contribute nothing.
        let Some(grad_output) = self.gradients.get(&node_id).copied() else {
            return Ok(());
        };

        let (op, input_ids, output) = {
            let node = self
                .nodes
                .get(&node_id)
                .ok_or(NanogradError::NodeNotFound { id: node_id })?;
            match &node.op {
                Some(op) => (op.clone_op(), node.inputs.clone(), node.data),
                // Leaf nodes: the gradient stops here.
                None => return Ok(()),
            }
        };

        let input_data: Vec<f64> = input_ids
            .iter()
            .map(|&input_id| {
                self.get_data(input_id)
                    .ok_or(NanogradError::NodeNotFound { id: input_id })
            })
            .collect::<Result<_, _>>()?;

        let input_grads = op.gradient(grad_output, &input_data, output)?;
        trace!("{}: {} distributes grad {}", node_id, op.name(), grad_output);

        for (&input_id, input_grad) in input_ids.iter().zip(input_grads) {
            self.accumulate_gradient(input_id, input_grad);
        }

        Ok(())
    }

    fn accumulate_gradient(&mut self, node_id: NodeId, grad: f64) {
        *self.gradients.entry(node_id).or_insert(0.0) += grad;
    }
}
