//! # Nanograd
//!
//! Nanograd is a scalar reverse-mode automatic differentiation engine
//! written in Rust, with a small neural-network module hierarchy
//! (neuron, layer, multilayer perceptron) built on top of it.
//!
//! ## Features
//!
//! - Reverse-mode automatic differentiation (backpropagation)
//! - Dynamic computation graph construction as a side effect of arithmetic
//! - Gradient accumulation with shared-subexpression support
//! - High-level neural network modules
//! - Swappable weight initialization for deterministic testing
//! - Written 100% in safe Rust
//!
pub mod error;
pub mod graph;
pub mod nn;

// Re-export commonly used types for convenience
pub use error::NanogradError;
pub use graph::{Engine, NodeId};
pub use nn::{Layer, Mlp, Module, Neuron};
