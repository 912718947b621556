//! Parameter Store
//!
//! Weights and biases of the two dense layers, their seeded initialization,
//! and the matching gradient container produced by backpropagation.

use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::{Normal, Uniform};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Layer widths of the network: input -> hidden -> output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkShape {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
}

impl NetworkShape {
    pub fn new(input_dim: usize, hidden_dim: usize, output_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dim,
            output_dim,
        }
    }

    /// Reject zero-sized layers
    pub fn validate(&self) -> Result<()> {
        for (name, dim) in [
            ("input_dim", self.input_dim),
            ("hidden_dim", self.hidden_dim),
            ("output_dim", self.output_dim),
        ] {
            if dim == 0 {
                return Err(Error::InvalidConfiguration(format!(
                    "{} must be positive",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Total number of trainable scalars
    pub fn num_parameters(&self) -> usize {
        self.input_dim * self.hidden_dim
            + self.hidden_dim
            + self.hidden_dim * self.output_dim
            + self.output_dim
    }
}

/// Weight initialization scheme
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitScheme {
    /// Standard normal scaled by a small constant
    Small { scale: f64 },
    /// He/Kaiming normal: std = sqrt(2 / fan_in)
    He,
    /// Xavier/Glorot uniform: limit = sqrt(6 / (fan_in + fan_out))
    Xavier,
}

impl Default for InitScheme {
    fn default() -> Self {
        InitScheme::Small { scale: 0.01 }
    }
}

impl InitScheme {
    pub fn validate(&self) -> Result<()> {
        if let InitScheme::Small { scale } = self {
            if !scale.is_finite() || *scale < 0.0 {
                return Err(Error::InvalidConfiguration(format!(
                    "init scale must be finite and non-negative, got {}",
                    scale
                )));
            }
        }
        Ok(())
    }

    /// Short label used in logs and sweep tables
    pub fn label(&self) -> String {
        match self {
            InitScheme::Small { scale } => format!("small({})", scale),
            InitScheme::He => "he".to_string(),
            InitScheme::Xavier => "xavier".to_string(),
        }
    }

    /// Draw a (fan_in x fan_out) weight matrix
    fn sample<R: Rng>(&self, fan_in: usize, fan_out: usize, rng: &mut R) -> Result<Array2<f64>> {
        let dim = (fan_in, fan_out);
        let weights = match *self {
            InitScheme::Small { scale } => {
                let normal = Normal::new(0.0, scale)
                    .map_err(|e| Error::InvalidConfiguration(format!("init scale: {}", e)))?;
                Array2::random_using(dim, normal, rng)
            }
            InitScheme::He => {
                let std = (2.0 / fan_in as f64).sqrt();
                let normal = Normal::new(0.0, std)
                    .map_err(|e| Error::InvalidConfiguration(format!("he init: {}", e)))?;
                Array2::random_using(dim, normal, rng)
            }
            InitScheme::Xavier => {
                let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
                Array2::random_using(dim, Uniform::new(-limit, limit), rng)
            }
        };
        Ok(weights)
    }
}

/// Weights and biases of both layers
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Hidden layer weights (input_dim x hidden_dim)
    pub w1: Array2<f64>,
    /// Hidden layer biases (hidden_dim)
    pub b1: Array1<f64>,
    /// Output layer weights (hidden_dim x output_dim)
    pub w2: Array2<f64>,
    /// Output layer biases (output_dim)
    pub b2: Array1<f64>,
}

impl Parameters {
    /// Random weights and zero biases, reproducible for a given seed.
    ///
    /// The generator is created here and dropped on return, so repeated or
    /// concurrent runs never share random state.
    pub fn initialize(shape: NetworkShape, scheme: InitScheme, seed: u64) -> Result<Self> {
        shape.validate()?;
        scheme.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let w1 = scheme.sample(shape.input_dim, shape.hidden_dim, &mut rng)?;
        let w2 = scheme.sample(shape.hidden_dim, shape.output_dim, &mut rng)?;

        Ok(Self {
            w1,
            b1: Array1::zeros(shape.hidden_dim),
            w2,
            b2: Array1::zeros(shape.output_dim),
        })
    }

    /// All-zero parameters. Useful for deterministic checks; a network
    /// started here has symmetric hidden units and never breaks symmetry.
    pub fn zeros(shape: NetworkShape) -> Self {
        Self {
            w1: Array2::zeros((shape.input_dim, shape.hidden_dim)),
            b1: Array1::zeros(shape.hidden_dim),
            w2: Array2::zeros((shape.hidden_dim, shape.output_dim)),
            b2: Array1::zeros(shape.output_dim),
        }
    }

    /// Assemble parameters from existing arrays, checking that the
    /// dimensions chain.
    pub fn from_arrays(
        w1: Array2<f64>,
        b1: Array1<f64>,
        w2: Array2<f64>,
        b2: Array1<f64>,
    ) -> Result<Self> {
        let params = Self { w1, b1, w2, b2 };
        params.check_consistent()?;
        Ok(params)
    }

    pub fn check_consistent(&self) -> Result<()> {
        let hidden = self.w1.ncols();
        if self.b1.len() != hidden {
            return Err(Error::shape_mismatch("b1", hidden, self.b1.len()));
        }
        if self.w2.nrows() != hidden {
            return Err(Error::shape_mismatch("w2 rows", hidden, self.w2.nrows()));
        }
        if self.b2.len() != self.w2.ncols() {
            return Err(Error::shape_mismatch("b2", self.w2.ncols(), self.b2.len()));
        }
        Ok(())
    }

    pub fn shape(&self) -> NetworkShape {
        NetworkShape::new(self.w1.nrows(), self.w1.ncols(), self.w2.ncols())
    }

    pub fn num_parameters(&self) -> usize {
        self.w1.len() + self.b1.len() + self.w2.len() + self.b2.len()
    }

    pub fn is_finite(&self) -> bool {
        self.w1.iter().all(|v| v.is_finite())
            && self.b1.iter().all(|v| v.is_finite())
            && self.w2.iter().all(|v| v.is_finite())
            && self.b2.iter().all(|v| v.is_finite())
    }
}

/// Gradient of the loss with respect to every parameter tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub w1: Array2<f64>,
    pub b1: Array1<f64>,
    pub w2: Array2<f64>,
    pub b2: Array1<f64>,
}

impl Gradients {
    /// Zero gradients shaped like `params`
    pub fn zeros_like(params: &Parameters) -> Self {
        Self {
            w1: Array2::zeros(params.w1.dim()),
            b1: Array1::zeros(params.b1.len()),
            w2: Array2::zeros(params.w2.dim()),
            b2: Array1::zeros(params.b2.len()),
        }
    }

    /// Every gradient tensor must have exactly its parameter's shape
    pub fn check_matches(&self, params: &Parameters) -> Result<()> {
        if self.w1.dim() != params.w1.dim() {
            return Err(Error::shape_mismatch(
                "dW1",
                format!("{:?}", params.w1.dim()),
                format!("{:?}", self.w1.dim()),
            ));
        }
        if self.b1.len() != params.b1.len() {
            return Err(Error::shape_mismatch("db1", params.b1.len(), self.b1.len()));
        }
        if self.w2.dim() != params.w2.dim() {
            return Err(Error::shape_mismatch(
                "dW2",
                format!("{:?}", params.w2.dim()),
                format!("{:?}", self.w2.dim()),
            ));
        }
        if self.b2.len() != params.b2.len() {
            return Err(Error::shape_mismatch("db2", params.b2.len(), self.b2.len()));
        }
        Ok(())
    }

    /// Euclidean norm over all four tensors
    pub fn global_norm(&self) -> f64 {
        let sum_sq = self.w1.iter().map(|g| g * g).sum::<f64>()
            + self.b1.iter().map(|g| g * g).sum::<f64>()
            + self.w2.iter().map(|g| g * g).sum::<f64>()
            + self.b2.iter().map(|g| g * g).sum::<f64>();
        sum_sq.sqrt()
    }
}
