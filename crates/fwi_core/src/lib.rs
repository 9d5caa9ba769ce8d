//! Fire Weather Index inference core
//!
//! Loads a fitted prediction artifact and turns named meteorological
//! readings into an FWI estimate.
//!
//! Modules:
//! - `features`: Feature map validation and ordered row assembly
//! - `transforms`: Imputer, polynomial expander, scaler and linear regressor
//! - `artifact`: Artifact packaging, digest verification and loading
//! - `pipeline`: The fixed-order inference chain
//! - `risk`: Fire danger bands for predicted values
//! - `errors`: Error taxonomy shared by serving and tooling
//! - `testing`: Hand-built artifacts for tests (`testing` feature)

pub mod artifact;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod risk;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transforms;

pub use artifact::{
    hash_path, ArtifactMetadata, LoadOptions, PredictionArtifact, ARTIFACT_FORMAT_VERSION,
    MAX_EXPANDED_WIDTH,
};
pub use errors::{FwiError, Stage};
pub use features::{assemble_row, coerce_value, default_feature_names, FeatureMap, FEATURE_NAMES};
pub use pipeline::{predict, predict_row, round_prediction, InferencePipeline, PipelineTrace};
pub use risk::RiskLevel;
pub use transforms::{
    ImputeStrategy, LinearModel, PolynomialFeatures, Regressor, RegressorKind, SimpleImputer,
    StandardScaler, Transform,
};

/// Crate version string recorded in health responses
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
