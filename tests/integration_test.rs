//! Integration tests for the two-layer digit classifier

use approx::assert_relative_eq;
use ndarray::{array, Array2};
use rust_nn_digits::{
    data::one_hot,
    experiments::{run_sweep, SweepGrid, SweepOptimizer},
    nn::{forward, train_step, GradientDescent, InitScheme, NetworkShape, OptimizerKind, Parameters},
    training::{accuracy, predict_classes, Trainer, TrainerState},
    utils::Config,
    Batch, Error, LoaderConfig, TrainingConfig,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Six samples, three well separated classes
const TOY_CSV: &str = "\
label,p0,p1,p2,p3
0,9,1,0,2
0,8,2,1,0
1,1,9,8,1
1,0,7,9,2
2,2,1,1,9
2,1,0,2,8
";

fn toy_loader() -> LoaderConfig {
    LoaderConfig {
        num_classes: 3,
        pixel_scale: 10.0,
        ..LoaderConfig::default()
    }
}

fn toy_config(epochs: usize) -> TrainingConfig {
    TrainingConfig {
        hidden_dim: 8,
        epochs,
        learning_rate: 0.5,
        report_interval: 50,
        seed: 42,
        init: InitScheme::Small { scale: 0.1 },
        optimizer: OptimizerKind::GradientDescent,
    }
}

fn toy_csv_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(TOY_CSV.as_bytes()).unwrap();
    file
}

/// With all-zero parameters every class gets the same probability and only
/// the output bias receives a gradient
#[test]
fn test_zero_parameters_single_step() {
    let mut params = Parameters::zeros(NetworkShape::new(4, 3, 2));
    let features = array![[0.1, 0.2, 0.3, 0.4], [0.5, 0.6, 0.7, 0.8]];
    let batch = Batch::from_labels(features, &[0, 0], 2).unwrap();

    let cache = forward(batch.features(), &params).unwrap();
    assert!(cache.a2.iter().all(|&p| (p - 0.5).abs() < 1e-12));

    let mut optimizer = GradientDescent::new(0.1);
    let output = train_step(&mut params, &batch, &mut optimizer).unwrap();

    assert_relative_eq!(output.loss, 2.0_f64.ln(), epsilon = 1e-6);
    assert_relative_eq!(params.b2[0], 0.05, epsilon = 1e-12);
    assert_relative_eq!(params.b2[1], -0.05, epsilon = 1e-12);
    assert!(params.w1.iter().all(|&w| w == 0.0));
    assert!(params.w2.iter().all(|&w| w == 0.0));
    assert!(params.b1.iter().all(|&b| b == 0.0));
}

/// Argmax predictions against labels
#[test]
fn test_accuracy_two_of_three() {
    let probs = array![[0.7, 0.2, 0.1], [0.1, 0.8, 0.1], [0.3, 0.3, 0.4]];
    let predicted = predict_classes(&probs);
    assert_eq!(predicted, vec![0, 1, 2]);
    assert_relative_eq!(accuracy(&predicted, &[0, 1, 0]).unwrap(), 2.0 / 3.0);
}

/// Load a CSV, train, and fit the toy problem
#[test]
fn test_train_from_csv() {
    let file = toy_csv_file();
    let dataset = rust_nn_digits::load_csv(file.path(), &toy_loader()).unwrap();
    assert_eq!(dataset.len(), 6);
    assert_eq!(dataset.input_dim(), 4);

    let batch = dataset.to_batch().unwrap();
    let mut trainer = Trainer::new(toy_config(300), batch.input_dim(), batch.num_classes()).unwrap();
    let history = trainer.fit(&batch).unwrap();

    assert_eq!(trainer.state(), TrainerState::Done);
    assert_eq!(history.losses.len(), 300);
    assert_eq!(history.reports.len(), 6);
    assert!(history.losses.iter().all(|&l| l.is_finite() && l >= 0.0));
    assert!(history.losses[299] < history.losses[0]);

    let eval = trainer.evaluate(&batch).unwrap();
    assert_relative_eq!(eval.accuracy, 1.0);
}

/// Same seed, same data, same trajectory
#[test]
fn test_training_is_deterministic() {
    let file = toy_csv_file();
    let batch = rust_nn_digits::load_csv(file.path(), &toy_loader())
        .unwrap()
        .to_batch()
        .unwrap();

    let (p1, h1) = rust_nn_digits::train(toy_config(20), &batch).unwrap();
    let (p2, h2) = rust_nn_digits::train(toy_config(20), &batch).unwrap();
    assert_eq!(p1, p2);
    assert_eq!(h1, h2);
}

/// A batch of one sample trains without shape trouble
#[test]
fn test_batch_of_one() {
    let batch = Batch::new(array![[0.3, 0.7]], one_hot(&[1], 2).unwrap()).unwrap();
    let config = TrainingConfig {
        hidden_dim: 4,
        epochs: 10,
        learning_rate: 0.1,
        report_interval: 5,
        ..TrainingConfig::default()
    };
    let (params, history) = rust_nn_digits::train(config, &batch).unwrap();
    assert_eq!(params.w1.dim(), (2, 4));
    assert_eq!(history.reports.len(), 2);
    assert!(history.losses[9] < history.losses[0]);
}

/// Features narrower than the network are rejected before any update
#[test]
fn test_shape_mismatch_rejected() {
    let mut trainer = Trainer::new(toy_config(5), 4, 3).unwrap();
    let batch = Batch::from_labels(Array2::zeros((2, 5)), &[0, 1], 3).unwrap();
    let before = trainer.parameters().clone();

    assert!(matches!(
        trainer.fit(&batch),
        Err(Error::ShapeMismatch { .. })
    ));
    assert_eq!(trainer.parameters(), &before);
}

/// Sweep over a small grid, with the config file driving the grid
#[test]
fn test_sweep_from_config() {
    let mut config_file = NamedTempFile::new().unwrap();
    config_file
        .write_all(
            br#"
[training]
epochs = 10
learning_rate = 0.5

[sweep]
hidden_dims = [4, 8]
inits = [{ type = "xavier" }]
"#,
        )
        .unwrap();
    let config = Config::load(config_file.path()).unwrap();
    assert_eq!(config.sweep.hidden_dims, vec![4, 8]);
    assert_eq!(config.sweep.optimizers, SweepGrid::default().optimizers);

    let grid = SweepGrid {
        optimizers: vec![SweepOptimizer {
            optimizer: OptimizerKind::GradientDescent,
            learning_rate: 0.5,
        }],
        ..config.sweep.clone()
    };

    let file = toy_csv_file();
    let batch = rust_nn_digits::load_csv(file.path(), &toy_loader())
        .unwrap()
        .to_batch()
        .unwrap();
    let results = run_sweep(&grid, &config.training_config(), &batch, None).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].hidden_dim, 4);
    assert_eq!(results[1].hidden_dim, 8);
    assert!(results.iter().all(|r| r.succeeded() && r.test.is_none()));

    let json = serde_json::to_string(&results).unwrap();
    assert!(json.contains("\"hidden_dim\":8"));
}
