use super::initializers::fan_in_uniform;
use crate::error::NanogradError;
use crate::graph::Engine;
use crate::graph::node::NodeId;
use crate::nn::Module;

/// A single neuron: weighted sum of its inputs plus a bias, optionally
/// passed through a tanh nonlinearity.
///
/// Weights and bias are leaf values created in the computation graph at
/// construction time, so their ids stay stable across forward calls and an
/// external optimizer can enumerate and update them between passes.
#[derive(Debug, Clone)]
pub struct Neuron {
    weights: Vec<NodeId>,
    bias: NodeId,
    in_features: usize,
    nonlinear: bool,
}

impl Neuron {
    /// Creates a new neuron over `in_features` inputs.
    ///
    /// # Weight Initialization
    ///
    /// Weights are sampled from the fan-in-scaled uniform initializer.
    /// Bias is initialized to zero.
    pub fn new(graph: &mut Engine, in_features: usize, nonlinear: bool) -> Self {
        Self::with_init(graph, in_features, nonlinear, fan_in_uniform(in_features))
    }

    /// Creates a new neuron with custom weight initialization.
    ///
    /// # Arguments
    ///
    /// * `graph` - The computation graph the parameters are created in
    /// * `in_features` - Number of inputs
    /// * `nonlinear` - Whether the output passes through tanh
    /// * `init_fn` - Function producing one value per weight
    pub fn with_init<F>(
        graph: &mut Engine,
        in_features: usize,
        nonlinear: bool,
        mut init_fn: F,
    ) -> Self
    where
        F: FnMut() -> f64,
    {
        let weights = (0..in_features)
            .map(|_| graph.create_value(init_fn(), true))
            .collect();
        let bias = graph.create_value(0.0, true);

        Self {
            weights,
            bias,
            in_features,
            nonlinear,
        }
    }

    /// Returns the input width.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns whether the output passes through the nonlinearity.
    pub fn is_nonlinear(&self) -> bool {
        self.nonlinear
    }
}

impl Module for Neuron {
    fn forward(
        &self,
        graph: &mut Engine,
        inputs: &[NodeId],
    ) -> Result<Vec<NodeId>, NanogradError> {
        if inputs.len() != self.in_features {
            return Err(NanogradError::InputWidthMismatch {
                expected: self.in_features,
                actual: inputs.len(),
            });
        }

        // bias + sum_i(w_i * x_i); the bias enters the sum exactly once.
        let mut acc = self.bias;
        for (&weight, &input) in self.weights.iter().zip(inputs) {
            let term = graph.mul(weight, input)?;
            acc = graph.add(acc, term)?;
        }

        let out = if self.nonlinear { graph.tanh(acc)? } else { acc };
        Ok(vec![out])
    }

    fn parameters(&self) -> Vec<NodeId> {
        // Weights first, bias last.
        let mut params = self.weights.clone();
        params.push(self.bias);
        params
    }
}

/// A fully connected layer: `out_features` neurons running over the same
/// inputs.
#[derive(Debug, Clone)]
pub struct Layer {
    neurons: Vec<Neuron>,
    in_features: usize,
    out_features: usize,
}

impl Layer {
    /// Creates a new layer of `out_features` neurons over `in_features`
    /// inputs, each initialized with the fan-in-scaled uniform sampler.
    pub fn new(
        graph: &mut Engine,
        in_features: usize,
        out_features: usize,
        nonlinear: bool,
    ) -> Self {
        let neurons = (0..out_features)
            .map(|_| Neuron::new(graph, in_features, nonlinear))
            .collect();

        Self {
            neurons,
            in_features,
            out_features,
        }
    }

    /// Creates a new layer with custom weight initialization shared by all
    /// of its neurons.
    pub fn with_init<F>(
        graph: &mut Engine,
        in_features: usize,
        out_features: usize,
        nonlinear: bool,
        mut init_fn: F,
    ) -> Self
    where
        F: FnMut() -> f64,
    {
        let neurons = (0..out_features)
            .map(|_| Neuron::with_init(graph, in_features, nonlinear, &mut init_fn))
            .collect();

        Self {
            neurons,
            in_features,
            out_features,
        }
    }

    /// Returns the input width.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the output width.
    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Module for Layer {
    fn forward(
        &self,
        graph: &mut Engine,
        inputs: &[NodeId],
    ) -> Result<Vec<NodeId>, NanogradError> {
        if inputs.len() != self.in_features {
            return Err(NanogradError::InputWidthMismatch {
                expected: self.in_features,
                actual: inputs.len(),
            });
        }

        let mut outputs = Vec::with_capacity(self.neurons.len());
        for neuron in &self.neurons {
            outputs.extend(neuron.forward(graph, inputs)?);
        }
        Ok(outputs)
    }

    fn parameters(&self) -> Vec<NodeId> {
        // Concatenation of each neuron's parameters, in neuron order.
        let mut params = Vec::new();
        for neuron in &self.neurons {
            params.extend(neuron.parameters());
        }
        params
    }
}

/// A multilayer perceptron: fully connected layers chained so each layer's
/// output feeds the next layer's input.
///
/// All layers apply the tanh nonlinearity except the last, which stays
/// linear. The chain of widths is fixed at construction, so consecutive
/// layers are consistent by construction and `forward` only has to check
/// the width of the caller-supplied inputs.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Layer>,
    in_features: usize,
}

impl Mlp {
    /// Creates a new MLP with the given input width and layer output
    /// widths, e.g. `Mlp::new(&mut graph, 3, &[4, 4, 1])`.
    pub fn new(
        graph: &mut Engine,
        in_features: usize,
        layer_sizes: &[usize],
    ) -> Result<Self, NanogradError> {
        if layer_sizes.is_empty() {
            return Err(NanogradError::EmptyNetwork);
        }

        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut nin = in_features;
        for (i, &nout) in layer_sizes.iter().enumerate() {
            let nonlinear = i != layer_sizes.len() - 1;
            layers.push(Layer::new(graph, nin, nout, nonlinear));
            nin = nout;
        }

        Ok(Self { layers, in_features })
    }

    /// Creates a new MLP with custom weight initialization shared by all
    /// of its layers.
    pub fn with_init<F>(
        graph: &mut Engine,
        in_features: usize,
        layer_sizes: &[usize],
        mut init_fn: F,
    ) -> Result<Self, NanogradError>
    where
        F: FnMut() -> f64,
    {
        if layer_sizes.is_empty() {
            return Err(NanogradError::EmptyNetwork);
        }

        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut nin = in_features;
        for (i, &nout) in layer_sizes.iter().enumerate() {
            let nonlinear = i != layer_sizes.len() - 1;
            layers.push(Layer::with_init(graph, nin, nout, nonlinear, &mut init_fn));
            nin = nout;
        }

        Ok(Self { layers, in_features })
    }

    /// Returns the input width.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the owned layers, first to last.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl Module for Mlp {
    fn forward(
        &self,
        graph: &mut Engine,
        inputs: &[NodeId],
    ) -> Result<Vec<NodeId>, NanogradError> {
        // Sequential chain: layer i's outputs are layer i+1's inputs.
        let mut current = inputs.to_vec();
        for layer in &self.layers {
            current = layer.forward(graph, &current)?;
        }
        Ok(current)
    }

    fn parameters(&self) -> Vec<NodeId> {
        // Concatenation of each layer's parameters, in layer order.
        let mut params = Vec::new();
        for layer in &self.layers {
            params.extend(layer.parameters());
        }
        params
    }
}
