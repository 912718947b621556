//! Hyperparameter sweeps
//!
//! Trains one fresh network per combination of hidden width, initialization
//! scheme and optimizer, all from the same seed, and collects final train
//! (and optionally test) loss and accuracy.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::Batch;
use crate::error::{Error, Result};
use crate::nn::{InitScheme, OptimizerKind};
use crate::training::{evaluate, train, Evaluation, TrainingConfig};

/// An optimizer together with the learning rate it runs at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepOptimizer {
    pub optimizer: OptimizerKind,
    pub learning_rate: f64,
}

/// Values to try along each axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    pub hidden_dims: Vec<usize>,
    pub inits: Vec<InitScheme>,
    pub optimizers: Vec<SweepOptimizer>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            hidden_dims: vec![64, 128, 256],
            inits: vec![InitScheme::default(), InitScheme::He, InitScheme::Xavier],
            optimizers: vec![
                SweepOptimizer {
                    optimizer: OptimizerKind::GradientDescent,
                    learning_rate: 0.01,
                },
                SweepOptimizer {
                    optimizer: OptimizerKind::Momentum { momentum: 0.9 },
                    learning_rate: 0.01,
                },
                SweepOptimizer {
                    optimizer: OptimizerKind::adam(),
                    learning_rate: 0.001,
                },
            ],
        }
    }
}

impl SweepGrid {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_dims.is_empty() || self.inits.is_empty() || self.optimizers.is_empty() {
            return Err(Error::InvalidConfiguration(
                "sweep grid needs at least one value on every axis".to_string(),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hidden_dims.len() * self.inits.len() * self.optimizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination as a full training configuration
    pub fn configs(&self, base: &TrainingConfig) -> Vec<TrainingConfig> {
        let mut configs = Vec::with_capacity(self.len());
        for &hidden_dim in &self.hidden_dims {
            for &init in &self.inits {
                for setting in &self.optimizers {
                    configs.push(TrainingConfig {
                        hidden_dim,
                        init,
                        optimizer: setting.optimizer,
                        learning_rate: setting.learning_rate,
                        ..base.clone()
                    });
                }
            }
        }
        configs
    }
}

/// Outcome of one sweep run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub hidden_dim: usize,
    pub init: InitScheme,
    pub optimizer: OptimizerKind,
    pub learning_rate: f64,
    pub train: Option<Evaluation>,
    pub test: Option<Evaluation>,
    /// Set when the run diverged
    pub error: Option<String>,
}

impl ExperimentResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Train every grid combination. A diverging run is recorded and the sweep
/// moves on; any other error aborts the sweep.
pub fn run_sweep(
    grid: &SweepGrid,
    base: &TrainingConfig,
    train_batch: &Batch,
    test_batch: Option<&Batch>,
) -> Result<Vec<ExperimentResult>> {
    grid.validate()?;
    let configs = grid.configs(base);
    let total = configs.len();
    let mut results = Vec::with_capacity(total);

    for (i, config) in configs.into_iter().enumerate() {
        info!(
            "[{}/{}] hidden = {}, init = {}, optimizer = {}, lr = {}",
            i + 1,
            total,
            config.hidden_dim,
            config.init.label(),
            config.optimizer.label(),
            config.learning_rate
        );

        let mut result = ExperimentResult {
            hidden_dim: config.hidden_dim,
            init: config.init,
            optimizer: config.optimizer,
            learning_rate: config.learning_rate,
            train: None,
            test: None,
            error: None,
        };

        match train(config, train_batch) {
            Ok((params, _history)) => {
                result.train = Some(evaluate(&params, train_batch)?);
                result.test = test_batch
                    .map(|batch| evaluate(&params, batch))
                    .transpose()?;
            }
            Err(e) if e.is_divergence() => {
                warn!("Run {} diverged: {}", i + 1, e);
                result.error = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        results.push(result);
    }

    Ok(results)
}

/// Plain-text table of sweep results
pub fn format_table(results: &[ExperimentResult]) -> String {
    let mut out = format!(
        "{:>7}  {:<12}  {:<14}  {:>8}  {:>10}  {:>9}  {:>10}  {:>9}\n",
        "hidden", "init", "optimizer", "lr", "train_loss", "train_acc", "test_loss", "test_acc"
    );

    let cell = |eval: Option<Evaluation>, pick: fn(&Evaluation) -> f64| {
        eval.map_or_else(|| "-".to_string(), |e| format!("{:.4}", pick(&e)))
    };

    for r in results {
        let (train_loss, train_acc) = match (&r.error, r.train) {
            (Some(_), _) => ("diverged".to_string(), "-".to_string()),
            (None, train) => (cell(train, |e| e.loss), cell(train, |e| e.accuracy)),
        };
        out.push_str(&format!(
            "{:>7}  {:<12}  {:<14}  {:>8}  {:>10}  {:>9}  {:>10}  {:>9}\n",
            r.hidden_dim,
            r.init.label(),
            r.optimizer.label(),
            r.learning_rate,
            train_loss,
            train_acc,
            cell(r.test, |e| e.loss),
            cell(r.test, |e| e.accuracy),
        ));
    }
    out
}
