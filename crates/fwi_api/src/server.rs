use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fwi_core::{FwiError, InferencePipeline, LoadOptions, PredictionArtifact};
use serde::Serialize;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ApiConfig;

/// Body of `GET /`
pub const WELCOME_MESSAGE: &str = "Welcome to the Fire Weather Index Prediction API!";

/// Process-wide state: the loaded artifact, immutable for the process lifetime
pub struct AppState {
    pipeline: InferencePipeline,
    start_time: Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(artifact: Arc<PredictionArtifact>) -> Self {
        Self {
            pipeline: InferencePipeline::new(artifact),
            start_time: Instant::now(),
        }
    }

    pub fn pipeline(&self) -> &InferencePipeline {
        &self.pipeline
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Load the artifact named by `config`. Any failure is fatal to startup.
pub fn load_state(config: &ApiConfig) -> Result<AppState, FwiError> {
    let options = LoadOptions {
        require_hash: config.require_hash,
    };
    let artifact = PredictionArtifact::load_with(&config.artifact_path, options)?;
    Ok(AppState::new(Arc::new(artifact)))
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct WelcomeResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(rename = "predicted_FWI")]
    pub predicted_fwi: f64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_secs: u64,
    regressor: String,
    feature_names: Vec<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<FwiError> for ApiError {
    fn from(err: FwiError) -> Self {
        if err.is_client_error() {
            warn!("Rejected prediction request: {}", err);
            Self::bad_request(err.to_string())
        } else {
            error!("Prediction failed: {}", err);
            Self::internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        let err = FwiError::MalformedRequest(rejection.body_text());
        warn!("Rejected request body: {}", err);
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

pub async fn start_server(state: AppState, config: &ApiConfig) -> Result<()> {
    let app = build_router(Arc::new(state), config.body_limit_bytes);
    let listener = bind_listener(&config.bind_address()).await?;
    info!("FWI API listening on {}", config.bind_address());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind API listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind API listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub fn build_router(state: SharedState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/api/health", get(handle_health))
        .route("/api/predict", post(handle_predict))
        .route("/predict", post(handle_predict))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_index() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE,
    })
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let artifact = state.pipeline().artifact();
    Json(HealthResponse {
        status: "healthy",
        service: "fwi-api",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_seconds(),
        regressor: artifact.metadata.regressor.to_string(),
        feature_names: artifact.feature_names.clone(),
    })
}

async fn handle_predict(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(body) = payload?;
    let features = match body {
        Value::Object(map) => map,
        other => {
            return Err(FwiError::MalformedRequest(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))
            .into())
        }
    };

    let predicted_fwi = state.pipeline().predict(&features)?;
    Ok(Json(PredictResponse { predicted_fwi }))
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    ApiError::internal("internal server error").into_response()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("regressor exploded")
    }

    #[tokio::test]
    async fn panicking_handler_returns_json_500() {
        let app = Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(handle_panic));

        let request = Request::get("/explode").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "internal server error" }));
    }

    #[test]
    fn pipeline_errors_map_to_status_codes() {
        let missing = ApiError::from(FwiError::MissingFeature("BUI".into()));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let non_finite = ApiError::from(FwiError::NonFinitePrediction(f64::INFINITY));
        assert_eq!(non_finite.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
