//! Prediction artifact packaging, verification and loading
//!
//! The artifact is written once by the trainer as JSON, alongside a
//! `<file>.hash` sidecar holding the hex BLAKE3 digest of the exact bytes.
//! Serving loads it once at startup and never mutates it.

use crate::errors::{FwiError, Result};
use crate::transforms::{
    LinearModel, PolynomialFeatures, Regressor, RegressorKind, SimpleImputer, StandardScaler,
    Transform,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current on-disk format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Largest expanded row a loadable artifact may declare
pub const MAX_EXPANDED_WIDTH: usize = 1 << 16;

/// Provenance recorded by the trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub created_at: i64,
    pub regressor: RegressorKind,
    #[serde(default)]
    pub train_samples: usize,
    #[serde(default)]
    pub test_samples: usize,
    /// Holdout R², absent when no holdout was used
    #[serde(default)]
    pub r2_test: Option<f64>,
}

/// Fitted imputer, feature expander, scaler and regressor with their input schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub imputer: SimpleImputer,
    pub feature_expander: PolynomialFeatures,
    pub scaler: StandardScaler,
    pub regressor: LinearModel,
    pub metadata: ArtifactMetadata,
}

/// Loader behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Fail when the `.hash` sidecar is absent
    pub require_hash: bool,
}

/// Sidecar path holding the artifact digest
pub fn hash_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".hash");
    PathBuf::from(name)
}

/// Hex BLAKE3 digest of the serialized artifact bytes
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

impl PredictionArtifact {
    /// Check that every stage's width agrees with its neighbours and that
    /// all fitted parameters are usable.
    pub fn validate(&self) -> Result<()> {
        let schema = |msg: String| -> Result<()> { Err(FwiError::ArtifactLoad(msg)) };

        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return schema(format!(
                "unsupported format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            ));
        }

        let n = self.feature_names.len();
        if n == 0 {
            return schema("artifact declares no features".into());
        }
        let mut seen = HashSet::with_capacity(n);
        for name in &self.feature_names {
            if name.trim().is_empty() {
                return schema("artifact declares an empty feature name".into());
            }
            if !seen.insert(name.as_str()) {
                return schema(format!("duplicate feature name {name}"));
            }
        }

        if self.imputer.input_width() != n {
            return schema(format!(
                "imputer expects {} columns but {} features are declared",
                self.imputer.input_width(),
                n
            ));
        }
        if self.feature_expander.input_width() != self.imputer.output_width() {
            return schema(format!(
                "feature expander expects {} columns, imputer produces {}",
                self.feature_expander.input_width(),
                self.imputer.output_width()
            ));
        }
        match self.feature_expander.checked_output_width() {
            Some(0) => return schema("feature expander produces no columns".into()),
            Some(width) if width <= MAX_EXPANDED_WIDTH => {}
            _ => {
                return schema(format!(
                    "feature expander of degree {} exceeds {} columns",
                    self.feature_expander.degree, MAX_EXPANDED_WIDTH
                ))
            }
        }
        if self.scaler.mean.len() != self.scaler.scale.len() {
            return schema("scaler mean and scale lengths differ".into());
        }
        if self.scaler.input_width() != self.feature_expander.output_width() {
            return schema(format!(
                "scaler expects {} columns, feature expander produces {}",
                self.scaler.input_width(),
                self.feature_expander.output_width()
            ));
        }
        if self.regressor.input_width() != self.scaler.output_width() {
            return schema(format!(
                "regressor expects {} columns, scaler produces {}",
                self.regressor.input_width(),
                self.scaler.output_width()
            ));
        }

        if !self.imputer.statistics.iter().all(|v| v.is_finite()) {
            return schema("imputer statistics contain non-finite values".into());
        }
        if !self.scaler.mean.iter().all(|v| v.is_finite()) {
            return schema("scaler means contain non-finite values".into());
        }
        if !self.scaler.scale.iter().all(|v| v.is_finite() && *v != 0.0) {
            return schema("scaler scales must be finite and non-zero".into());
        }
        if !self.regressor.coefficients.iter().all(|v| v.is_finite())
            || !self.regressor.intercept.is_finite()
        {
            return schema("regressor parameters contain non-finite values".into());
        }

        Ok(())
    }

    /// Parse and validate an artifact from JSON bytes
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: PredictionArtifact = serde_json::from_slice(bytes)
            .map_err(|e| FwiError::ArtifactLoad(format!("corrupt artifact: {e}")))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load with default options (sidecar verified when present)
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, LoadOptions::default())
    }

    /// Read, verify and validate an artifact file
    pub fn load_with(path: &Path, options: LoadOptions) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            FwiError::ArtifactLoad(format!("cannot read {}: {e}", path.display()))
        })?;

        let sidecar = hash_path(path);
        match std::fs::read_to_string(&sidecar) {
            Ok(expected) => {
                let actual = digest_hex(&bytes);
                if expected.trim() != actual {
                    return Err(FwiError::ArtifactLoad(format!(
                        "digest mismatch for {}: expected {}, computed {}",
                        path.display(),
                        expected.trim(),
                        actual
                    )));
                }
                debug!("Artifact digest verified: {}", actual);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if options.require_hash {
                    return Err(FwiError::ArtifactLoad(format!(
                        "missing digest sidecar {}",
                        sidecar.display()
                    )));
                }
                warn!(
                    "No digest sidecar at {}; skipping integrity check",
                    sidecar.display()
                );
            }
            Err(e) => {
                return Err(FwiError::ArtifactLoad(format!(
                    "cannot read {}: {e}",
                    sidecar.display()
                )))
            }
        }

        let artifact = Self::from_json_bytes(&bytes)?;
        info!(
            "Loaded {} artifact from {} ({} features)",
            artifact.metadata.regressor,
            path.display(),
            artifact.feature_names.len()
        );
        Ok(artifact)
    }

    /// Write the artifact and its digest sidecar, returning the digest
    pub fn save(&self, path: &Path) -> Result<String> {
        self.validate()?;
        let bytes = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &bytes)?;

        let digest = digest_hex(&bytes);
        std::fs::write(hash_path(path), &digest)?;
        Ok(digest)
    }
}
