//! Command-line entry point
//!
//! - `train`: train one network and report held-out accuracy
//! - `sweep`: train a grid of configurations and write the results as JSON
//! - `init-config`: write a default configuration file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use rust_nn_digits::{
    experiments::format_table,
    load_csv, run_sweep,
    utils::{setup_logging, verbosity_level, Config},
    Batch, Trainer,
};

#[derive(Parser)]
#[command(name = "nn_digits")]
#[command(version = "0.1.0")]
#[command(about = "Two-layer neural network digit classifier", long_about = None)]
struct Cli {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a single network
    Train {
        /// Training CSV (label, pixels...)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Held-out CSV for final evaluation
        #[arg(short, long)]
        test_data: Option<PathBuf>,

        /// Width of the hidden layer
        #[arg(long)]
        hidden_dim: Option<usize>,

        /// Number of epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Learning rate
        #[arg(short, long)]
        learning_rate: Option<f64>,

        /// Report every N epochs
        #[arg(short, long)]
        report_interval: Option<usize>,

        /// Initialization seed
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Train every combination in the sweep grid
    Sweep {
        /// Training CSV (label, pixels...)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Held-out CSV for final evaluation
        #[arg(short, long)]
        test_data: Option<PathBuf>,

        /// Number of epochs per run
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Where to write the results
        #[arg(short, long, default_value = "results.json")]
        output: PathBuf,
    },

    /// Write the default configuration
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    setup_logging(verbosity_level(cli.verbose, &config.logging.level))?;

    match cli.command {
        Commands::Train {
            data,
            test_data,
            hidden_dim,
            epochs,
            learning_rate,
            report_interval,
            seed,
        } => {
            let mut config = config;
            if let Some(path) = data {
                config.data.train_path = path;
            }
            if test_data.is_some() {
                config.data.test_path = test_data;
            }
            if let Some(hidden_dim) = hidden_dim {
                config.model.hidden_dim = hidden_dim;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if let Some(lr) = learning_rate {
                config.training.learning_rate = lr;
            }
            if let Some(interval) = report_interval {
                config.training.report_interval = interval;
            }
            if let Some(seed) = seed {
                config.training.seed = seed;
            }
            config.validate()?;
            train_model(&config)?;
        }

        Commands::Sweep {
            data,
            test_data,
            epochs,
            output,
        } => {
            let mut config = config;
            if let Some(path) = data {
                config.data.train_path = path;
            }
            if test_data.is_some() {
                config.data.test_path = test_data;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            config.validate()?;
            sweep(&config, &output)?;
        }

        Commands::InitConfig { output } => {
            Config::create_default(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// Training batch plus an optional held-out batch, following the data section
fn load_batches(config: &Config) -> Result<(Batch, Option<Batch>)> {
    let loader = config.loader_config();
    let train = load_csv(&config.data.train_path, &loader)
        .with_context(|| format!("loading {}", config.data.train_path.display()))?;

    if let Some(path) = &config.data.test_path {
        let test = load_csv(path, &loader)
            .with_context(|| format!("loading {}", path.display()))?;
        return Ok((train.to_batch()?, Some(test.to_batch()?)));
    }

    if config.data.validation_fraction > 0.0 {
        let (train, held_out) = train
            .split(1.0 - config.data.validation_fraction, config.training.seed)?;
        info!(
            "Holding out {} of {} samples for evaluation",
            held_out.len(),
            train.len() + held_out.len()
        );
        return Ok((train.to_batch()?, Some(held_out.to_batch()?)));
    }

    Ok((train.to_batch()?, None))
}

fn train_model(config: &Config) -> Result<()> {
    let (train_batch, test_batch) = load_batches(config)?;

    let mut trainer = Trainer::new(
        config.training_config(),
        train_batch.input_dim(),
        train_batch.num_classes(),
    )?;
    info!(
        "Network {} -> {} -> {} ({} parameters)",
        train_batch.input_dim(),
        config.model.hidden_dim,
        train_batch.num_classes(),
        trainer.parameters().num_parameters()
    );

    let history = trainer.fit(&train_batch)?;

    let train_eval = trainer.evaluate(&train_batch)?;
    println!("\n=== Training Summary ===");
    println!("Epochs:          {}", history.losses.len());
    if let Some(report) = history.final_report() {
        println!("Final loss:      {:.6}", report.loss);
    }
    println!("Train accuracy:  {:.2}%", train_eval.accuracy * 100.0);

    match test_batch {
        Some(test) => {
            let test_eval = trainer.evaluate(&test)?;
            println!("Test loss:       {:.6}", test_eval.loss);
            println!("Test accuracy:   {:.2}%", test_eval.accuracy * 100.0);
        }
        None => warn!("No held-out data configured; skipping test evaluation"),
    }

    Ok(())
}

fn sweep(config: &Config, output: &Path) -> Result<()> {
    let (train_batch, test_batch) = load_batches(config)?;

    info!("Sweeping {} configurations", config.sweep.len());
    let results = run_sweep(
        &config.sweep,
        &config.training_config(),
        &train_batch,
        test_batch.as_ref(),
    )?;

    println!("\n{}", format_table(&results));

    let json = serde_json::to_string_pretty(&results)?;
    std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    info!("Saved {} results to {}", results.len(), output.display());

    Ok(())
}
