//! Loss Function
//!
//! Categorical cross-entropy over softmax probabilities.

use ndarray::{Array2, Zip};

use crate::error::{Error, Result};

/// Added to every probability before taking the log, so a zero prediction
/// yields a large but finite penalty instead of `-inf`.
pub const EPSILON: f64 = 1e-8;

/// Mean categorical cross-entropy:
/// `-mean_rows(sum_classes(targets * ln(probabilities + EPSILON)))`
///
/// The stabilized probability is capped at 1, which keeps each log term
/// non-positive and therefore the loss non-negative.
pub fn cross_entropy(probabilities: &Array2<f64>, targets: &Array2<f64>) -> Result<f64> {
    if probabilities.dim() != targets.dim() {
        return Err(Error::shape_mismatch(
            "cross-entropy targets",
            format!("{:?}", probabilities.dim()),
            format!("{:?}", targets.dim()),
        ));
    }
    if probabilities.nrows() == 0 {
        return Err(Error::shape_mismatch("cross-entropy batch", "at least 1 row", 0));
    }

    let m = probabilities.nrows() as f64;
    let total = Zip::from(probabilities)
        .and(targets)
        .fold(0.0, |acc, &p, &y| acc + y * capped_ln(p + EPSILON));

    Ok(-total / m)
}

/// `ln(min(q, 1))` that lets NaN through; `f64::min` would swallow it
fn capped_ln(q: f64) -> f64 {
    if q >= 1.0 {
        0.0
    } else {
        q.ln()
    }
}
