//! # Two-Layer Neural Network Digit Classifier
//!
//! A dense network (input -> ReLU hidden layer -> softmax output) trained with
//! full-batch gradient descent on cross-entropy loss, built on `ndarray`.
//!
//! ## Modules
//!
//! - `nn` - Parameters, forward/backward passes, loss and optimizers
//! - `data` - CSV loading, one-hot encoding and training batches
//! - `training` - Epoch loop with periodic loss/accuracy reports
//! - `experiments` - Hyperparameter sweeps over width, initialization and optimizer
//! - `utils` - Configuration and logging
//!
//! ## Example
//!
//! ```no_run
//! use rust_nn_digits::{load_csv, train, LoaderConfig, TrainingConfig};
//!
//! let dataset = load_csv("data/train.csv", &LoaderConfig::default())?;
//! let batch = dataset.to_batch()?;
//! let (params, history) = train(TrainingConfig::default(), &batch)?;
//! println!("final loss {:?}, {} parameters", history.final_loss(), params.num_parameters());
//! # Ok::<(), rust_nn_digits::Error>(())
//! ```

pub mod data;
pub mod error;
pub mod experiments;
pub mod nn;
pub mod training;
pub mod utils;

pub use data::{load_csv, Batch, Dataset, LoaderConfig};
pub use error::{Error, Result};
pub use experiments::{run_sweep, ExperimentResult, SweepGrid};
pub use nn::{InitScheme, NetworkShape, OptimizerKind, Parameters};
pub use training::{train, Trainer, TrainingConfig, TrainingHistory};
