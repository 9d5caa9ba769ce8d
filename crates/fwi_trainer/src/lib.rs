//! FWI trainer - offline fitting of prediction artifacts
//!
//! Reads the fire weather CSV, fits imputer, polynomial expansion, scaler
//! and one linear regressor, and produces the artifact the API serves.

pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod regression;
pub mod trainer;

use std::path::Path;

pub use dataset::Dataset;
pub use deterministic::{shuffled_indices, LcgRng};
pub use errors::TrainerError;
pub use regression::r2_score;
pub use trainer::{score, FwiTrainer, TrainingOutcome, TrainingParams};

/// Train an artifact directly from a CSV file using the given parameters.
pub fn train_artifact_from_csv(
    path: &Path,
    feature_names: &[String],
    target: &str,
    params: TrainingParams,
) -> Result<TrainingOutcome, TrainerError> {
    let dataset = Dataset::from_csv(path, feature_names, target)
        .map_err(|err| TrainerError::Dataset(format!("{err:#}")))?;
    FwiTrainer::new(params).train(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
