use crate::error::NanogradError;
use crate::graph::Engine;
use crate::graph::node::NodeId;

/// The base trait for all neural network modules.
///
/// This trait defines the interface that all network components implement:
/// running the forward pass through the computation graph and enumerating
/// the module's trainable values. Modules here map an ordered sequence of
/// input values to an ordered sequence of output values, which lets a
/// single-output neuron, a layer and a whole network share one interface.
///
/// # Examples
///
/// ```rust
/// use nanograd::graph::Engine;
/// use nanograd::nn::{Module, Neuron};
///
/// let mut graph = Engine::new();
/// let neuron = Neuron::new(&mut graph, 2, true);
///
/// let x0 = graph.create_value(0.5, false);
/// let x1 = graph.create_value(-1.0, false);
/// let out = neuron.forward(&mut graph, &[x0, x1]).unwrap();
///
/// graph.backward(out[0]).unwrap();
/// assert_eq!(neuron.parameters().len(), 3);
/// ```
pub trait Module {
    /// Runs the module over `inputs` and returns its output values.
    ///
    /// `inputs` must match the module's declared input width; a mismatch is
    /// a caller contract violation and fails with
    /// [`NanogradError::InputWidthMismatch`] rather than truncating or
    /// padding.
    fn forward(&self, graph: &mut Engine, inputs: &[NodeId])
    -> Result<Vec<NodeId>, NanogradError>;

    /// Returns every trainable value owned by this module.
    ///
    /// The order is fixed and part of the contract: external optimizers
    /// index parameters by position.
    fn parameters(&self) -> Vec<NodeId>;

    /// Returns the number of trainable values in this module.
    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Clears the accumulated gradients of this module's parameters.
    fn zero_grad(&self, graph: &mut Engine) {
        for param in self.parameters() {
            graph.clear_gradient(param);
        }
    }
}
