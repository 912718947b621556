//! Configuration management
//!
//! TOML configuration with one section per concern. Every field has a
//! default, so a partial file (or no file at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::LoaderConfig;
use crate::error::{Error, Result};
use crate::experiments::SweepGrid;
use crate::nn::{InitScheme, OptimizerKind};
use crate::training::TrainingConfig;

/// Data configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub train_path: PathBuf,
    pub test_path: Option<PathBuf>,
    pub num_classes: usize,
    pub has_header: bool,
    pub pixel_scale: f64,
    pub limit: Option<usize>,
    /// Share of the training file held out for evaluation when no test file is given
    pub validation_fraction: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        let loader = LoaderConfig::default();
        Self {
            train_path: PathBuf::from("data/train.csv"),
            test_path: None,
            num_classes: loader.num_classes,
            has_header: loader.has_header,
            pixel_scale: loader.pixel_scale,
            limit: loader.limit,
            validation_fraction: 0.0,
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub hidden_dim: usize,
    pub init: InitScheme,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_dim: 128,
            init: InitScheme::default(),
        }
    }
}

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    pub epochs: usize,
    pub learning_rate: f64,
    pub report_interval: usize,
    pub seed: u64,
    pub optimizer: OptimizerKind,
}

impl Default for TrainingSection {
    fn default() -> Self {
        let defaults = TrainingConfig::default();
        Self {
            epochs: defaults.epochs,
            learning_rate: defaults.learning_rate,
            report_interval: defaults.report_interval,
            seed: defaults.seed,
            optimizer: defaults.optimizer,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingSection,
    pub sweep: SweepGrid,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, or defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create default configuration file
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        Config::default().save(path)
    }

    pub fn validate(&self) -> Result<()> {
        self.loader_config().validate()?;
        let fraction = self.data.validation_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(Error::InvalidConfiguration(format!(
                "validation_fraction must be in [0, 1), got {}",
                fraction
            )));
        }
        self.training_config().validate()
    }

    /// Hyperparameters of a single training run
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            hidden_dim: self.model.hidden_dim,
            epochs: self.training.epochs,
            learning_rate: self.training.learning_rate,
            report_interval: self.training.report_interval,
            seed: self.training.seed,
            init: self.model.init,
            optimizer: self.training.optimizer,
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            num_classes: self.data.num_classes,
            has_header: self.data.has_header,
            pixel_scale: self.data.pixel_scale,
            limit: self.data.limit,
        }
    }
}
