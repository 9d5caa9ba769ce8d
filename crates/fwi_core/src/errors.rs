//! Error types for the FWI core

use thiserror::Error;

/// Errors that can occur while loading an artifact or running a prediction
#[derive(Error, Debug)]
pub enum FwiError {
    /// A required feature is absent from the request
    #[error("Missing field: {0}")]
    MissingFeature(String),

    /// A feature value cannot be read as a number
    #[error("Invalid value for field {name}: {value}")]
    InvalidValue { name: String, value: String },

    /// A transform stage received a row of the wrong width
    #[error("Transform stage {stage} expected {expected} columns, got {actual}")]
    Transform {
        stage: Stage,
        expected: usize,
        actual: usize,
    },

    /// The regressor produced NaN or infinity
    #[error("Regressor produced a non-finite value: {0}")]
    NonFinitePrediction(f64),

    /// The prediction artifact could not be loaded
    #[error("Failed to load prediction artifact: {0}")]
    ArtifactLoad(String),

    /// Request body was absent or not a JSON object
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FwiError {
    /// Whether the failure was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FwiError::MissingFeature(_)
                | FwiError::InvalidValue { .. }
                | FwiError::MalformedRequest(_)
        )
    }
}

/// Position in the fixed transform chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Imputer,
    FeatureExpander,
    Scaler,
    Regressor,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Imputer => "imputer",
            Stage::FeatureExpander => "feature_expander",
            Stage::Scaler => "scaler",
            Stage::Regressor => "regressor",
        };
        f.write_str(name)
    }
}

/// Result type for FWI core operations
pub type Result<T> = std::result::Result<T, FwiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        assert!(FwiError::MissingFeature("BUI".into()).is_client_error());
        assert!(FwiError::InvalidValue {
            name: "RH".into(),
            value: "\"wet\"".into()
        }
        .is_client_error());
        assert!(FwiError::MalformedRequest("empty body".into()).is_client_error());
    }

    #[test]
    fn pipeline_failures_are_server_errors() {
        let err = FwiError::Transform {
            stage: Stage::Scaler,
            expected: 91,
            actual: 12,
        };
        assert!(!err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Transform stage scaler expected 91 columns, got 12"
        );
        assert!(!FwiError::NonFinitePrediction(f64::NAN).is_client_error());
        assert!(!FwiError::ArtifactLoad("missing".into()).is_client_error());
    }
}
