// Scalar operations for the computation graph.
// Each operation computes its forward value eagerly and records how to
// distribute an incoming gradient to the operands it saved. Rust has no
// inheritance, so the operations share a common trait and are dispatched
// dynamically through it.
use std::any::type_name;

use crate::error::NanogradError;

/// All operations in the computation graph implement this trait.
pub trait Operator: std::fmt::Debug {
    /// Computes the forward value from the operand payloads.
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError>;

    /// Distributes `grad_output` to the saved operands.
    ///
    /// `inputs` are the operand payloads captured when the node was built
    /// and `output` is this node's own forward value, so rules like relu,
    /// tanh and exp can read their result instead of recomputing it.
    /// Returns one partial derivative per operand, in operand order; the
    /// engine accumulates them into the operands' gradients.
    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        output: f64,
    ) -> Result<Vec<f64>, NanogradError>;

    /// Number of operands this operation expects.
    fn num_inputs(&self) -> usize;

    fn name(&self) -> String {
        let full_name = type_name::<Self>();
        full_name
            .rsplit("::")
            .next()
            .unwrap_or(full_name)
            .to_string()
    }

    fn clone_op(&self) -> Box<dyn Operator>;
}

/// Scalar addition: output = a + b
#[derive(Debug, Clone)]
pub struct Add;

impl Operator for Add {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0] + inputs[1])
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        _output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        // d/da(a + b) = 1, d/db(a + b) = 1
        Ok(vec![grad_output, grad_output])
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Scalar subtraction: output = a - b
#[derive(Debug, Clone)]
pub struct Sub;

impl Operator for Sub {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0] - inputs[1])
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        _output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        // d/da(a - b) = 1, d/db(a - b) = -1
        Ok(vec![grad_output, -grad_output])
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Scalar multiplication: output = a * b
#[derive(Debug, Clone)]
pub struct Mul;

impl Operator for Mul {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0] * inputs[1])
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        _output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        // d/da(a * b) = b, d/db(a * b) = a
        Ok(vec![inputs[1] * grad_output, inputs[0] * grad_output])
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Scalar division: output = a / b
///
/// Division by zero follows IEEE 754 semantics: the forward value and the
/// partials become `Inf`/`NaN` payloads instead of failing.
#[derive(Debug, Clone)]
pub struct Div;

impl Operator for Div {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0] / inputs[1])
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        _output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        // d/da(a / b) = 1/b, d/db(a / b) = -a/b²
        let grad_a = grad_output / inputs[1];
        let grad_b = -grad_output * inputs[0] / (inputs[1] * inputs[1]);
        Ok(vec![grad_a, grad_b])
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Scalar power: output = a^p
///
/// The exponent is saved as an operand but treated as a constant: no
/// gradient flows into it. Differentiating the exponent would require
/// ln(a), which is NaN for any non-positive base and would poison the
/// common integer-exponent uses of this operation.
///
/// A negative base with a fractional exponent yields NaN per `f64::powf`.
#[derive(Debug, Clone)]
pub struct Pow;

impl Operator for Pow {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0].powf(inputs[1]))
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        _output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 2 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 2,
                actual: inputs.len(),
            });
        }
        // d/da(a^p) = p * a^(p-1); the exponent's partial is fixed at zero.
        let grad_base = inputs[1] * inputs[0].powf(inputs[1] - 1.0) * grad_output;
        Ok(vec![grad_base, 0.0])
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Rectified linear unit: output = max(0, a)
#[derive(Debug, Clone)]
pub struct ReLU;

impl Operator for ReLU {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0].max(0.0))
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        // The gradient passes through only where the unit was active; the
        // threshold test reads the saved output of the forward pass.
        let grad = if output > 0.0 { grad_output } else { 0.0 };
        Ok(vec![grad])
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Hyperbolic tangent: output = tanh(a)
#[derive(Debug, Clone)]
pub struct Tanh;

impl Operator for Tanh {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0].tanh())
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        // d/da(tanh(a)) = 1 - tanh(a)², expressed through the saved output.
        Ok(vec![(1.0 - output * output) * grad_output])
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Scalar exponential: output = e^a
#[derive(Debug, Clone)]
pub struct Exp;

impl Operator for Exp {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0].exp())
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        // d/da(e^a) = e^a, which is exactly the saved forward output.
        Ok(vec![output * grad_output])
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Natural logarithm: output = ln(a)
///
/// A non-positive operand follows IEEE 754 semantics: ln(0) is -Inf and
/// ln of a negative value is NaN; neither fails the call.
#[derive(Debug, Clone)]
pub struct Log;

impl Operator for Log {
    fn compute(&self, inputs: &[f64]) -> Result<f64, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        Ok(inputs[0].ln())
    }

    fn gradient(
        &self,
        grad_output: f64,
        inputs: &[f64],
        _output: f64,
    ) -> Result<Vec<f64>, NanogradError> {
        if inputs.len() != 1 {
            return Err(NanogradError::ArityMismatch {
                op: self.name(),
                expected: 1,
                actual: inputs.len(),
            });
        }
        // d/da(ln(a)) = 1/a
        Ok(vec![grad_output / inputs[0]])
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn clone_op(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}
