//! Error types for the digit classifier library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Array dimensions do not line up with the network or with each other
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// Loss or an updated parameter became NaN or infinite
    #[error("Numeric instability at epoch {epoch}: loss = {loss}")]
    NumericInstability { epoch: usize, loss: f64 },

    /// Rejected before training starts
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed input data (bad label, out-of-range pixel, ...)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Config file parsing error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config file serialization error
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::ShapeMismatch`] from anything displayable
    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Error::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Whether training may have left the parameters in a usable state
    pub fn is_divergence(&self) -> bool {
        matches!(self, Error::NumericInstability { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = Error::shape_mismatch("batch features", "784 columns", "783 columns");
        assert_eq!(
            err.to_string(),
            "Shape mismatch in batch features: expected 784 columns, got 783 columns"
        );
    }

    #[test]
    fn test_is_divergence() {
        let err = Error::NumericInstability { epoch: 3, loss: f64::NAN };
        assert!(err.is_divergence());
        assert!(!Error::InvalidConfiguration("epochs".into()).is_divergence());
    }
}
