//! Evaluation metrics

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::Batch;
use crate::error::{Error, Result};
use crate::nn::{cross_entropy, forward, Parameters};

/// Loss and accuracy of a parameter set on one batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
}

/// Index of the largest entry in each row; the first index wins ties
pub fn predict_classes(probabilities: &Array2<f64>) -> Vec<usize> {
    probabilities
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &p)| {
                    if p > best.1 {
                        (i, p)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect()
}

/// Fraction of predictions equal to the true class
pub fn accuracy(predicted: &[usize], truth: &[usize]) -> Result<f64> {
    if predicted.len() != truth.len() {
        return Err(Error::shape_mismatch(
            "accuracy labels",
            predicted.len(),
            truth.len(),
        ));
    }
    if predicted.is_empty() {
        return Ok(0.0);
    }

    let correct = predicted
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count();

    Ok(correct as f64 / predicted.len() as f64)
}

/// Forward pass only: loss and accuracy without touching the parameters
pub fn evaluate(params: &Parameters, batch: &Batch) -> Result<Evaluation> {
    batch.check_shape(&params.shape())?;

    let cache = forward(batch.features(), params)?;
    let probabilities = cache.probabilities();
    let loss = cross_entropy(probabilities, batch.targets())?;
    let accuracy = accuracy(&predict_classes(probabilities), &batch.labels())?;

    Ok(Evaluation { loss, accuracy })
}
