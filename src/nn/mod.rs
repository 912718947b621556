//! Neural Network Module
//!
//! Building blocks of the two-layer classifier:
//! - Parameter store with seeded initialization
//! - Activation functions (ReLU, Softmax)
//! - Cross-entropy loss
//! - Forward and backward propagation
//! - Update rules (gradient descent, momentum, Adam)

mod activation;
mod loss;
mod network;
mod optimizer;
mod params;

pub use activation::{relu, relu_derivative, softmax};
pub use loss::{cross_entropy, EPSILON};
pub use network::{backward, compute_loss, forward, train_step, ForwardCache, StepOutput};
pub use optimizer::{Adam, GradientDescent, Momentum, Optimizer, OptimizerKind};
pub use params::{Gradients, InitScheme, NetworkShape, Parameters};
