//! Inference pipeline: validate → assemble → transform → predict → round
//!
//! The chain order is fixed (imputer, feature expander, scaler, regressor).
//! Calls share nothing but the read-only artifact.

use crate::artifact::PredictionArtifact;
use crate::errors::{FwiError, Result};
use crate::features::{assemble_row, FeatureMap};
use crate::transforms::{Regressor, Transform};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Decimal places kept in a returned prediction
pub const PREDICTION_DECIMALS: i32 = 3;

/// Round a raw regressor output to [`PREDICTION_DECIMALS`] places.
///
/// Values too large to scale have no fractional digits and pass through.
pub fn round_prediction(raw: f64) -> f64 {
    let factor = 10f64.powi(PREDICTION_DECIMALS);
    let scaled = raw * factor;
    if !scaled.is_finite() {
        return raw;
    }
    scaled.round() / factor
}

/// Predict FWI for one feature map.
///
/// Validation finishes before any transform runs, so a missing or invalid
/// feature never reaches the numeric stages.
pub fn predict(artifact: &PredictionArtifact, features: &FeatureMap) -> Result<f64> {
    let row = assemble_row(&artifact.feature_names, features)?;
    let raw = run_chain(artifact, row, None)?;
    Ok(round_prediction(raw))
}

/// Run an already assembled row through the chain without rounding.
///
/// Used offline to score holdout rows with exactly the serving transforms.
pub fn predict_row(artifact: &PredictionArtifact, row: Vec<f64>) -> Result<f64> {
    run_chain(artifact, row, None)
}

fn run_chain(
    artifact: &PredictionArtifact,
    row: Vec<f64>,
    mut trace: Option<&mut PipelineTrace>,
) -> Result<f64> {
    let stages: [&dyn Transform; 3] = [
        &artifact.imputer,
        &artifact.feature_expander,
        &artifact.scaler,
    ];

    let mut row = row;
    for stage in stages {
        row = stage.transform(&row)?;
        if let Some(trace) = trace.as_deref_mut() {
            trace.widths.push((stage.stage().to_string(), row.len()));
        }
    }

    let raw = artifact.regressor.predict(&row)?;
    if !raw.is_finite() {
        return Err(FwiError::NonFinitePrediction(raw));
    }
    if let Some(trace) = trace {
        trace.raw_prediction = Some(raw);
    }
    Ok(raw)
}

/// Column counts observed after each stage of one call
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineTrace {
    pub input_width: usize,
    pub widths: Vec<(String, usize)>,
    pub raw_prediction: Option<f64>,
}

/// Shareable handle over a loaded artifact
#[derive(Debug, Clone)]
pub struct InferencePipeline {
    artifact: Arc<PredictionArtifact>,
}

impl InferencePipeline {
    pub fn new(artifact: Arc<PredictionArtifact>) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &PredictionArtifact {
        &self.artifact
    }

    pub fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    #[instrument(skip_all, fields(features = features.len()))]
    pub fn predict(&self, features: &FeatureMap) -> Result<f64> {
        let value = predict(&self.artifact, features)?;
        debug!(predicted_fwi = value, "prediction complete");
        Ok(value)
    }

    /// Run the chain and record the width produced by each stage
    pub fn trace(&self, features: &FeatureMap) -> Result<PipelineTrace> {
        let row = assemble_row(&self.artifact.feature_names, features)?;
        let mut trace = PipelineTrace {
            input_width: row.len(),
            ..PipelineTrace::default()
        };
        run_chain(&self.artifact, row, Some(&mut trace))?;
        Ok(trace)
    }
}
