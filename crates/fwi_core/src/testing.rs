//! Hand-built artifacts and inputs for tests and local demos.
//!
//! The sample artifact is a degree-2 polynomial model whose only non-zero
//! weights sit on `ISI`, `BUI` and their product, so predictions can be
//! worked out by hand:
//! `FWI = 1.0 + 0.5 * ISI + 0.2 * BUI + 0.01 * ISI * BUI`.

use crate::artifact::{ArtifactMetadata, PredictionArtifact, ARTIFACT_FORMAT_VERSION};
use crate::features::{default_feature_names, FeatureMap};
use crate::transforms::{
    ImputeStrategy, LinearModel, PolynomialFeatures, RegressorKind, SimpleImputer,
    StandardScaler, Transform,
};
use serde_json::json;

const ISI: usize = 10;
const BUI: usize = 11;

/// Column means of the Algerian forest fires dataset, used as imputer fill values
const FEATURE_MEANS: [f64; 12] = [
    15.75, 7.5, 2012.0, 32.15, 62.04, 15.49, 0.76, 77.84, 14.68, 49.43, 4.74, 16.7,
];

/// Deterministic artifact over [`crate::FEATURE_NAMES`]
pub fn sample_artifact() -> PredictionArtifact {
    let feature_expander = PolynomialFeatures::new(FEATURE_MEANS.len(), 2);
    let combos = feature_expander.combinations();
    let width = combos.len();

    let position = |target: &[usize]| combos.iter().position(|combo| combo.as_slice() == target);
    let mut coefficients = vec![0.0; width];
    let weights: [(&[usize], f64); 3] = [(&[ISI], 0.5), (&[BUI], 0.2), (&[ISI, BUI], 0.01)];
    for (combo, weight) in weights {
        if let Some(idx) = position(combo) {
            coefficients[idx] = weight;
        }
    }

    // Identity scaling except the bias column, which is centred to zero.
    let mut mean = vec![0.0; width];
    mean[0] = 1.0;

    PredictionArtifact {
        format_version: ARTIFACT_FORMAT_VERSION,
        feature_names: default_feature_names(),
        imputer: SimpleImputer {
            strategy: ImputeStrategy::Mean,
            statistics: FEATURE_MEANS.to_vec(),
        },
        scaler: StandardScaler {
            mean,
            scale: vec![1.0; feature_expander.output_width()],
        },
        feature_expander,
        regressor: LinearModel {
            kind: RegressorKind::Ridge,
            alpha: 0.01,
            coefficients,
            intercept: 1.0,
        },
        metadata: ArtifactMetadata {
            created_at: 0,
            regressor: RegressorKind::Ridge,
            train_samples: 0,
            test_samples: 0,
            r2_test: None,
        },
    }
}

/// Artifact whose regressor ignores its input and returns `value`
pub fn constant_artifact(value: f64) -> PredictionArtifact {
    let mut artifact = sample_artifact();
    artifact.regressor.coefficients.iter_mut().for_each(|w| *w = 0.0);
    artifact.regressor.intercept = value;
    artifact
}

/// Default readings of the input form
pub fn reference_features() -> FeatureMap {
    let value = json!({
        "day": 15,
        "month": 7,
        "year": 2012,
        "Temperature": 30.0,
        "RH": 40.0,
        "Ws": 6.0,
        "Rain": 0.0,
        "FFMC": 85.0,
        "DMC": 25.0,
        "DC": 60.0,
        "ISI": 5.0,
        "BUI": 30.0
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => FeatureMap::new(),
    }
}

/// Prediction of [`sample_artifact`] for [`reference_features`]:
/// `1.0 + 2.5 + 6.0 + 1.5`
pub const REFERENCE_PREDICTION: f64 = 11.0;
