//! Training batch: normalized features paired with one-hot targets

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::nn::NetworkShape;

/// Features `[m x input_dim]` and one-hot targets `[m x output_dim]`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    features: Array2<f64>,
    targets: Array2<f64>,
}

impl Batch {
    /// Pair features with targets. Row counts must agree and the batch must
    /// not be empty, since every gradient is averaged over its rows.
    pub fn new(features: Array2<f64>, targets: Array2<f64>) -> Result<Self> {
        if features.nrows() != targets.nrows() {
            return Err(Error::shape_mismatch(
                "batch targets",
                format!("{} rows", features.nrows()),
                format!("{} rows", targets.nrows()),
            ));
        }
        if features.nrows() == 0 {
            return Err(Error::shape_mismatch("batch", "at least 1 row", "0 rows"));
        }
        Ok(Self { features, targets })
    }

    /// Build a batch from integer class labels
    pub fn from_labels(features: Array2<f64>, labels: &[usize], num_classes: usize) -> Result<Self> {
        let targets = super::one_hot(labels, num_classes)?;
        Self::new(features, targets)
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn targets(&self) -> &Array2<f64> {
        &self.targets
    }

    /// Number of rows (m)
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    pub fn input_dim(&self) -> usize {
        self.features.ncols()
    }

    pub fn num_classes(&self) -> usize {
        self.targets.ncols()
    }

    /// Class index of each row, recovered from the one-hot targets
    pub fn labels(&self) -> Vec<usize> {
        crate::training::predict_classes(&self.targets)
    }

    /// Fail fast if the batch does not fit the network
    pub fn check_shape(&self, shape: &NetworkShape) -> Result<()> {
        if self.input_dim() != shape.input_dim {
            return Err(Error::shape_mismatch(
                "batch features",
                format!("{} columns", shape.input_dim),
                format!("{} columns", self.input_dim()),
            ));
        }
        if self.num_classes() != shape.output_dim {
            return Err(Error::shape_mismatch(
                "batch targets",
                format!("{} columns", shape.output_dim),
                format!("{} columns", self.num_classes()),
            ));
        }
        Ok(())
    }
}
