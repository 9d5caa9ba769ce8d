//! Fits the transform chain and regressor into a prediction artifact

use crate::dataset::Dataset;
use crate::errors::TrainerError;
use crate::regression::{self, r2_score};
use fwi_core::{
    predict_row, ArtifactMetadata, ImputeStrategy, PolynomialFeatures, PredictionArtifact,
    RegressorKind, SimpleImputer, StandardScaler, Transform, ARTIFACT_FORMAT_VERSION,
    MAX_EXPANDED_WIDTH,
};
use tracing::{debug, info};

/// Training hyperparameters
#[derive(Debug, Clone)]
pub struct TrainingParams {
    pub regressor: RegressorKind,
    pub alpha: f64,
    pub degree: usize,
    pub test_fraction: f64,
    pub seed: u64,
    pub impute: ImputeStrategy,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            regressor: RegressorKind::Ridge,
            alpha: 0.01,
            degree: 2,
            test_fraction: 0.2,
            seed: 42,
            impute: ImputeStrategy::Mean,
        }
    }
}

/// Fitted artifact and its scores
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: PredictionArtifact,
    pub r2_train: f64,
    /// `None` when the holdout set is empty
    pub r2_test: Option<f64>,
}

pub struct FwiTrainer {
    params: TrainingParams,
}

impl FwiTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    fn check_params(&self, width: usize) -> Result<(), TrainerError> {
        let p = &self.params;
        if p.degree == 0 {
            return Err(TrainerError::Training("degree must be at least 1".into()));
        }
        let expanded = PolynomialFeatures::new(width, p.degree).checked_output_width();
        if expanded.map_or(true, |w| w > MAX_EXPANDED_WIDTH) {
            return Err(TrainerError::Training(format!(
                "degree {} expands past {} columns",
                p.degree, MAX_EXPANDED_WIDTH
            )));
        }
        if !(0.0..1.0).contains(&p.test_fraction) {
            return Err(TrainerError::Training(format!(
                "test fraction must be in [0, 1), got {}",
                p.test_fraction
            )));
        }
        Ok(())
    }

    /// Fit imputer, expander, scaler and regressor on the training split
    pub fn train(&self, dataset: &Dataset) -> Result<TrainingOutcome, TrainerError> {
        self.check_params(dataset.feature_count())?;
        if dataset.is_empty() {
            return Err(TrainerError::Dataset("dataset is empty".into()));
        }

        let (train, test) = dataset.split(self.params.test_fraction, self.params.seed);
        info!(
            "Training {} on {} samples ({} held out)",
            self.params.regressor,
            train.len(),
            test.len()
        );

        let width = dataset.feature_count();
        let imputer = SimpleImputer::fit(&train.features, width, self.params.impute);
        let feature_expander = PolynomialFeatures::new(width, self.params.degree);

        let expanded = train
            .features
            .iter()
            .map(|row| {
                let row = imputer.transform(row)?;
                feature_expander.transform(&row)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Expanded {} features to {}", width, feature_expander.output_width());

        let scaler = StandardScaler::fit(&expanded, feature_expander.output_width());
        let scaled = expanded
            .iter()
            .map(|row| scaler.transform(row))
            .collect::<Result<Vec<_>, _>>()?;

        let regressor =
            regression::fit(self.params.regressor, self.params.alpha, &scaled, &train.targets)?;

        let mut artifact = PredictionArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: dataset.feature_names.clone(),
            imputer,
            feature_expander,
            scaler,
            regressor,
            metadata: ArtifactMetadata {
                created_at: chrono::Utc::now().timestamp(),
                regressor: self.params.regressor,
                train_samples: train.len(),
                test_samples: test.len(),
                r2_test: None,
            },
        };
        artifact.validate()?;

        let r2_train = score(&artifact, &train)?;
        let r2_test = if test.is_empty() {
            None
        } else {
            Some(score(&artifact, &test)?)
        };
        artifact.metadata.r2_test = r2_test;

        info!("Training R²: {:.4}", r2_train);
        if let Some(r2) = r2_test {
            info!("Holdout R²: {:.4}", r2);
        }

        Ok(TrainingOutcome {
            artifact,
            r2_train,
            r2_test,
        })
    }
}

/// R² of the artifact's raw predictions over a dataset
pub fn score(artifact: &PredictionArtifact, dataset: &Dataset) -> Result<f64, TrainerError> {
    let predicted = dataset
        .features
        .iter()
        .map(|row| predict_row(artifact, row.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(r2_score(&dataset.targets, &predicted))
}
