//! FWI trainer CLI
//!
//! Fits one regressor on the fire weather dataset and writes the artifact
//! JSON plus its BLAKE3 sidecar.

use anyhow::{Context, Result};
use clap::Parser;
use fwi_core::{default_feature_names, hash_path, ImputeStrategy, RegressorKind};
use fwi_trainer::{Dataset, FwiTrainer, TrainingParams};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "fwi-train")]
#[command(author = "FWI Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline trainer for the Fire Weather Index predictor", long_about = None)]
struct Args {
    /// Input CSV dataset path (header row required)
    #[arg(short, long)]
    input: PathBuf,

    /// Output artifact path; the digest is written to `<output>.hash`
    #[arg(short, long, default_value = "models/fwi/active.json")]
    output: PathBuf,

    /// Target column name
    #[arg(long, default_value = "FWI")]
    target: String,

    /// Regressor to fit: linear, ridge or lasso
    #[arg(long, default_value = "ridge")]
    model: RegressorKind,

    /// Regularization strength for ridge and lasso
    #[arg(long, default_value = "0.01")]
    alpha: f64,

    /// Polynomial expansion degree
    #[arg(long, default_value = "2")]
    degree: usize,

    /// Fraction of rows held out for scoring
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Random seed for the holdout shuffle
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Fill missing cells with the column median instead of the mean
    #[arg(long)]
    median: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("FWI trainer v{}", env!("CARGO_PKG_VERSION"));

    let feature_names = default_feature_names();
    info!("Loading dataset from: {}", args.input.display());
    let dataset = Dataset::from_csv(&args.input, &feature_names, &args.target)
        .context("Failed to load dataset")?;

    info!(
        "Loaded {} samples with {} features ({} rows skipped)",
        dataset.len(),
        dataset.feature_count(),
        dataset.skipped_rows
    );
    for (name, missing) in feature_names.iter().zip(dataset.missing_counts()) {
        if missing > 0 {
            info!("  {}: {} missing values", name, missing);
        }
    }

    let params = TrainingParams {
        regressor: args.model,
        alpha: args.alpha,
        degree: args.degree,
        test_fraction: args.test_size,
        seed: args.seed,
        impute: if args.median {
            ImputeStrategy::Median
        } else {
            ImputeStrategy::Mean
        },
    };

    info!("Training configuration:");
    info!("  Regressor: {}", params.regressor);
    info!("  Alpha: {}", params.alpha);
    info!("  Degree: {}", params.degree);
    info!("  Test size: {}", params.test_fraction);
    info!("  Seed: {}", params.seed);

    let outcome = FwiTrainer::new(params)
        .train(&dataset)
        .context("Training failed")?;

    info!("Training complete");
    info!("  Train R²: {:.4}", outcome.r2_train);
    match outcome.r2_test {
        Some(r2) => info!("  Holdout R²: {:.4}", r2),
        None => info!("  Holdout R²: n/a (no holdout rows)"),
    }

    let digest = outcome
        .artifact
        .save(&args.output)
        .context("Failed to write artifact")?;

    info!("✓ Artifact written");
    info!("  Model: {}", args.output.display());
    info!("  Hash: {} ({})", hash_path(&args.output).display(), digest);

    Ok(())
}
