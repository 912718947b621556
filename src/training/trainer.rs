//! Training loop
//!
//! Full-batch gradient descent for a fixed number of epochs, reporting loss
//! and training accuracy at a fixed cadence. There is no early stopping.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::metrics::{accuracy, evaluate, predict_classes, Evaluation};
use crate::data::Batch;
use crate::error::{Error, Result};
use crate::nn::{train_step, InitScheme, NetworkShape, Optimizer, OptimizerKind, Parameters};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Width of the hidden layer
    pub hidden_dim: usize,
    /// Number of epochs
    pub epochs: usize,
    /// Step size of the update rule
    pub learning_rate: f64,
    /// Report loss and accuracy every this many epochs (and on the last one)
    pub report_interval: usize,
    /// Seed of the weight initialization
    pub seed: u64,
    /// Weight initialization scheme
    pub init: InitScheme,
    /// Update rule
    pub optimizer: OptimizerKind,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hidden_dim: 128,
            epochs: 50,
            learning_rate: 0.01,
            report_interval: 10,
            seed: 42,
            init: InitScheme::default(),
            optimizer: OptimizerKind::default(),
        }
    }
}

impl TrainingConfig {
    /// Reject configurations that cannot train
    pub fn validate(&self) -> Result<()> {
        if self.hidden_dim == 0 {
            return Err(Error::InvalidConfiguration(
                "hidden_dim must be positive".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidConfiguration(
                "epochs must be positive".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.report_interval == 0 {
            return Err(Error::InvalidConfiguration(
                "report_interval must be positive".to_string(),
            ));
        }
        self.init.validate()?;
        self.optimizer.validate()
    }
}

/// Lifecycle of a training run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    /// Parameters initialized, no epoch run yet
    Initialized,
    /// `epoch` epochs have completed
    Training { epoch: usize },
    /// Epoch budget exhausted, or halted on divergence
    Done,
}

/// Periodic progress report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// 1-based epoch number
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
}

/// What one call to [`Trainer::step`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOutcome {
    pub epoch: usize,
    pub loss: f64,
    pub report: Option<EpochReport>,
}

/// Loss of every epoch plus the periodic reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub losses: Vec<f64>,
    pub reports: Vec<EpochReport>,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }

    pub fn final_report(&self) -> Option<&EpochReport> {
        self.reports.last()
    }
}

/// Owns the parameters for the length of a run and mutates them once per
/// epoch.
pub struct Trainer {
    config: TrainingConfig,
    params: Parameters,
    optimizer: Box<dyn Optimizer>,
    state: TrainerState,
    history: TrainingHistory,
}

impl Trainer {
    /// Create a trainer with freshly initialized parameters
    pub fn new(config: TrainingConfig, input_dim: usize, output_dim: usize) -> Result<Self> {
        config.validate()?;
        let shape = NetworkShape::new(input_dim, config.hidden_dim, output_dim);
        let params = Parameters::initialize(shape, config.init, config.seed)?;
        Self::with_parameters(config, params)
    }

    /// Create a trainer that starts from the given parameters
    pub fn with_parameters(config: TrainingConfig, params: Parameters) -> Result<Self> {
        config.validate()?;
        params.check_consistent()?;
        params.shape().validate()?;
        if params.shape().hidden_dim != config.hidden_dim {
            return Err(Error::shape_mismatch(
                "hidden layer",
                config.hidden_dim,
                params.shape().hidden_dim,
            ));
        }

        let optimizer = config.optimizer.build(config.learning_rate);
        Ok(Self {
            config,
            params,
            optimizer,
            state: TrainerState::Initialized,
            history: TrainingHistory::default(),
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn into_parameters(self) -> Parameters {
        self.params
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Run one epoch: forward, loss, backward, update.
    ///
    /// Returns `Ok(None)` once the run is done. On a non-finite loss the
    /// trainer moves to [`TrainerState::Done`] without applying that epoch's
    /// update and returns [`Error::NumericInstability`].
    pub fn step(&mut self, batch: &Batch) -> Result<Option<EpochOutcome>> {
        let completed = match self.state {
            TrainerState::Initialized => 0,
            TrainerState::Training { epoch } => epoch,
            TrainerState::Done => return Ok(None),
        };
        let epoch = completed + 1;

        let output = match train_step(&mut self.params, batch, self.optimizer.as_mut()) {
            Ok(output) => output,
            Err(Error::NumericInstability { loss, .. }) => {
                warn!("Training diverged at epoch {} (loss = {})", epoch, loss);
                self.state = TrainerState::Done;
                return Err(Error::NumericInstability { epoch, loss });
            }
            Err(e) => return Err(e),
        };

        let loss = output.loss;
        self.history.losses.push(loss);
        debug!(epoch, loss, grad_norm = output.grad_norm, "epoch complete");

        let is_last = epoch == self.config.epochs;
        let report = if epoch % self.config.report_interval == 0 || is_last {
            // Probabilities come from this epoch's forward pass, i.e. the
            // parameters as they were before the update.
            let predicted = predict_classes(output.cache.probabilities());
            let accuracy = accuracy(&predicted, &batch.labels())?;
            info!(
                "Epoch {}/{}: loss = {:.6}, accuracy = {:.4}",
                epoch, self.config.epochs, loss, accuracy
            );
            let report = EpochReport {
                epoch,
                loss,
                accuracy,
            };
            self.history.reports.push(report);
            Some(report)
        } else {
            None
        };

        self.state = if is_last {
            TrainerState::Done
        } else {
            TrainerState::Training { epoch }
        };

        Ok(Some(EpochOutcome {
            epoch,
            loss,
            report,
        }))
    }

    /// Train until the epoch budget is exhausted
    pub fn fit(&mut self, batch: &Batch) -> Result<TrainingHistory> {
        batch.check_shape(&self.params.shape())?;
        info!(
            "Training {} epochs on {} samples ({} hidden units, lr = {}, optimizer = {})",
            self.config.epochs,
            batch.len(),
            self.config.hidden_dim,
            self.config.learning_rate,
            self.optimizer.name()
        );

        while self.step(batch)?.is_some() {}

        Ok(self.history.clone())
    }

    /// Loss and accuracy on any batch, e.g. held-out data
    pub fn evaluate(&self, batch: &Batch) -> Result<Evaluation> {
        evaluate(&self.params, batch)
    }

    /// Discard the current parameters and start over from the seeded
    /// initialization
    pub fn restart(&mut self) -> Result<()> {
        let shape = self.params.shape();
        self.params = Parameters::initialize(shape, self.config.init, self.config.seed)?;
        self.optimizer.reset();
        self.state = TrainerState::Initialized;
        self.history = TrainingHistory::default();
        Ok(())
    }
}

/// Initialize, train and hand back the trained parameters
pub fn train(config: TrainingConfig, batch: &Batch) -> Result<(Parameters, TrainingHistory)> {
    let mut trainer = Trainer::new(config, batch.input_dim(), batch.num_classes())?;
    let history = trainer.fit(batch)?;
    Ok((trainer.into_parameters(), history))
}
