//! Training module
//!
//! This module provides:
//! - The epoch loop with periodic loss/accuracy reports
//! - Prediction and accuracy metrics

mod metrics;
mod trainer;

pub use metrics::{accuracy, evaluate, predict_classes, Evaluation};
pub use trainer::{
    train, EpochOutcome, EpochReport, Trainer, TrainerState, TrainingConfig, TrainingHistory,
};
