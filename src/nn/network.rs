//! Forward and Backward Propagation
//!
//! The two-layer network `softmax(relu(X·W1 + b1)·W2 + b2)` and the
//! hand-derived gradients of its cross-entropy loss.

use ndarray::{Array2, Axis};

use super::activation::{relu, relu_derivative, softmax};
use super::loss::cross_entropy;
use super::optimizer::Optimizer;
use super::params::{Gradients, Parameters};
use crate::data::Batch;
use crate::error::{Error, Result};

/// Intermediate values of one forward pass, kept for backpropagation
#[derive(Debug, Clone)]
pub struct ForwardCache {
    /// Hidden pre-activation: X·W1 + b1
    pub z1: Array2<f64>,
    /// Hidden activation: relu(Z1)
    pub a1: Array2<f64>,
    /// Output logits: A1·W2 + b2
    pub z2: Array2<f64>,
    /// Class probabilities: softmax(Z2)
    pub a2: Array2<f64>,
}

impl ForwardCache {
    pub fn probabilities(&self) -> &Array2<f64> {
        &self.a2
    }
}

/// Result of one full training step
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Loss of the parameters before the update
    pub loss: f64,
    /// Forward pass of the parameters before the update
    pub cache: ForwardCache,
    /// Euclidean norm of the applied gradient
    pub grad_norm: f64,
}

/// Forward pass over a whole batch of inputs
pub fn forward(features: &Array2<f64>, params: &Parameters) -> Result<ForwardCache> {
    if features.ncols() != params.w1.nrows() {
        return Err(Error::shape_mismatch(
            "forward input",
            format!("{} columns", params.w1.nrows()),
            format!("{} columns", features.ncols()),
        ));
    }

    let z1 = features.dot(&params.w1) + &params.b1;
    let a1 = relu(&z1);
    let z2 = a1.dot(&params.w2) + &params.b2;
    let a2 = softmax(&z2);

    Ok(ForwardCache { z1, a1, z2, a2 })
}

/// Gradients of the mean cross-entropy with respect to every parameter.
///
/// Softmax and cross-entropy are differentiated together, which collapses
/// the output error to `A2 - Y`.
pub fn backward(batch: &Batch, params: &Parameters, cache: &ForwardCache) -> Result<Gradients> {
    let targets = batch.targets();
    if cache.a2.dim() != targets.dim() {
        return Err(Error::shape_mismatch(
            "backward targets",
            format!("{:?}", cache.a2.dim()),
            format!("{:?}", targets.dim()),
        ));
    }

    let m = batch.len() as f64;

    let dz2 = &cache.a2 - targets;
    let dw2 = cache.a1.t().dot(&dz2) / m;
    let db2 = dz2.sum_axis(Axis(0)) / m;

    let da1 = dz2.dot(&params.w2.t());
    let dz1 = da1 * relu_derivative(&cache.z1);
    let dw1 = batch.features().t().dot(&dz1) / m;
    let db1 = dz1.sum_axis(Axis(0)) / m;

    Ok(Gradients {
        w1: dw1,
        b1: db1,
        w2: dw2,
        b2: db2,
    })
}

/// Mean cross-entropy of `params` on `batch`
pub fn compute_loss(batch: &Batch, params: &Parameters) -> Result<f64> {
    let cache = forward(batch.features(), params)?;
    cross_entropy(&cache.a2, batch.targets())
}

/// Forward, loss, backward and update in sequence.
///
/// A non-finite loss, or an update that would leave a non-finite parameter,
/// is reported as [`Error::NumericInstability`] and the parameters are left
/// as they were.
pub fn train_step(
    params: &mut Parameters,
    batch: &Batch,
    optimizer: &mut dyn Optimizer,
) -> Result<StepOutput> {
    batch.check_shape(&params.shape())?;

    let cache = forward(batch.features(), params)?;
    let loss = cross_entropy(&cache.a2, batch.targets())?;
    if !loss.is_finite() {
        return Err(Error::NumericInstability { epoch: 0, loss });
    }

    let grads = backward(batch, params, &cache)?;
    let mut updated = params.clone();
    optimizer.update(&mut updated, &grads)?;
    if !updated.is_finite() {
        return Err(Error::NumericInstability { epoch: 0, loss });
    }
    *params = updated;

    Ok(StepOutput {
        loss,
        cache,
        grad_norm: grads.global_norm(),
    })
}
