//! Integration tests for the FWI trainer
//!
//! Trains on a synthetic dataset laid out like the regional fire weather CSV
//! and checks the written artifact serves predictions through `fwi-core`.

use anyhow::Result;
use fwi_core::{
    default_feature_names, predict, FeatureMap, LoadOptions, PredictionArtifact, RegressorKind,
    FEATURE_NAMES,
};
use fwi_trainer::{train_artifact_from_csv, Dataset, FwiTrainer, TrainingParams};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn feature_row(i: usize) -> [f64; 12] {
    [
        (i % 30 + 1) as f64,
        (i % 4 + 6) as f64,
        2012.0,
        22.0 + ((i * 7) % 15) as f64,
        40.0 + ((i * 11) % 45) as f64,
        10.0 + ((i * 3) % 12) as f64,
        ((i * 5) % 9) as f64 * 0.3,
        60.0 + ((i * 13) % 30) as f64,
        2.0 + ((i * 17) % 40) as f64 * 0.7,
        8.0 + ((i * 19) % 50) as f64 * 2.1,
        ((i * 23) % 19) as f64 * 0.8,
        1.0 + ((i * 29) % 37) as f64 * 1.3,
    ]
}

/// Target depends linearly on ISI and BUI
fn target(row: &[f64; 12]) -> f64 {
    0.5 + 0.4 * row[10] + 0.1 * row[11]
}

/// Create a synthetic dataset with a title line and a couple of bad rows
fn create_synthetic_dataset(rows: usize) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "{},FWI,Classes", FEATURE_NAMES.join(","))?;

    for i in 0..rows {
        let row = feature_row(i);
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(file, "{},{},fire", cells.join(","), target(&row))?;
        if i == 10 {
            writeln!(file, "Sidi-Bel Abbes Region Dataset")?;
        }
    }
    // A row with a missing target and one with an unknown rain reading
    writeln!(file, "1,6,2012,30,50,14,0,80,10,30,3,5,,not fire")?;
    let row = feature_row(rows);
    writeln!(
        file,
        "1,6,2012,30,50,14,?,80,10,30,{},{},{},fire",
        row[10],
        row[11],
        target(&row)
    )?;

    file.flush()?;
    Ok(file)
}

fn features_for(row: &[f64; 12]) -> FeatureMap {
    let mut map = FeatureMap::new();
    for (name, value) in FEATURE_NAMES.iter().zip(row) {
        map.insert(name.to_string(), json!(value));
    }
    map
}

#[test]
fn test_recovers_linear_relationship() -> Result<()> {
    let file = create_synthetic_dataset(200)?;
    let outcome = train_artifact_from_csv(
        file.path(),
        &default_feature_names(),
        "FWI",
        TrainingParams::default(),
    )?;

    assert!(outcome.r2_train > 0.999, "train R² {}", outcome.r2_train);
    let r2_test = outcome.r2_test.expect("holdout score");
    assert!(r2_test > 0.99, "holdout R² {r2_test}");

    assert_eq!(outcome.artifact.metadata.regressor, RegressorKind::Ridge);
    assert_eq!(outcome.artifact.metadata.train_samples + outcome.artifact.metadata.test_samples, 201);
    Ok(())
}

#[test]
fn test_deterministic_training() -> Result<()> {
    let file = create_synthetic_dataset(120)?;
    let dataset = Dataset::from_csv(file.path(), &default_feature_names(), "FWI")?;
    assert_eq!(dataset.len(), 121);
    assert_eq!(dataset.skipped_rows, 2);

    let params = TrainingParams {
        regressor: RegressorKind::Lasso,
        alpha: 0.001,
        ..TrainingParams::default()
    };
    let first = FwiTrainer::new(params.clone()).train(&dataset)?;
    let second = FwiTrainer::new(params).train(&dataset)?;

    assert_eq!(first.artifact.imputer, second.artifact.imputer);
    assert_eq!(first.artifact.scaler, second.artifact.scaler);
    assert_eq!(first.artifact.regressor, second.artifact.regressor);
    assert_eq!(first.r2_test, second.r2_test);

    let reseeded = FwiTrainer::new(TrainingParams {
        seed: 7,
        ..TrainingParams::default()
    })
    .train(&dataset)?;
    assert_ne!(first.artifact.imputer, reseeded.artifact.imputer);
    Ok(())
}

#[test]
fn test_saved_artifact_serves_predictions() -> Result<()> {
    let file = create_synthetic_dataset(200)?;
    let outcome = train_artifact_from_csv(
        file.path(),
        &default_feature_names(),
        "FWI",
        TrainingParams::default(),
    )?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("models").join("active.json");
    let digest = outcome.artifact.save(&path)?;
    assert_eq!(digest.len(), 64);

    let loaded = PredictionArtifact::load_with(&path, LoadOptions { require_hash: true })?;
    assert_eq!(loaded.feature_names, default_feature_names());
    assert_eq!(loaded.regressor, outcome.artifact.regressor);

    let row = feature_row(37);
    let predicted = predict(&loaded, &features_for(&row))?;
    assert!(
        (predicted - target(&row)).abs() < 0.1,
        "predicted {predicted}, expected {}",
        target(&row)
    );
    Ok(())
}

#[test]
fn test_missing_target_column_is_a_dataset_error() -> Result<()> {
    let file = create_synthetic_dataset(20)?;
    let result = train_artifact_from_csv(
        file.path(),
        &default_feature_names(),
        "Classes_FWI",
        TrainingParams::default(),
    );
    assert!(matches!(result, Err(fwi_trainer::TrainerError::Dataset(_))));
    Ok(())
}
