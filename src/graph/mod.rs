pub mod engine;
pub mod node;
pub mod op;
mod tests;

pub use engine::Engine;
pub use node::{Node, NodeId};
pub use op::{Add, Div, Exp, Log, Mul, Operator, Pow, ReLU, Sub, Tanh};
