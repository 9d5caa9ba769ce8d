//! Router-level tests for the prediction API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use fwi_api::{build_router, load_state, ApiConfig, AppState, WELCOME_MESSAGE};
use fwi_core::testing::{reference_features, sample_artifact, REFERENCE_PREDICTION};
use fwi_core::{FwiError, PredictionArtifact};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BODY_LIMIT: usize = 64 * 1024;

fn router_for(artifact: PredictionArtifact) -> Router {
    build_router(Arc::new(AppState::new(Arc::new(artifact))), BODY_LIMIT)
}

fn router() -> Router {
    router_for(sample_artifact())
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn assert_error_only(body: &Value) {
    assert!(body.get("error").and_then(Value::as_str).is_some(), "body: {body}");
    assert!(body.get("predicted_FWI").is_none(), "body: {body}");
}

#[tokio::test]
async fn index_returns_welcome_message() {
    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(router(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": WELCOME_MESSAGE }));
}

#[tokio::test]
async fn reference_input_is_predicted() {
    let payload = Value::Object(reference_features()).to_string();
    let (status, body) = send(router(), post_json("/api/predict", payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "predicted_FWI": REFERENCE_PREDICTION }));
}

#[tokio::test]
async fn alternate_route_serves_predictions() {
    let payload = Value::Object(reference_features()).to_string();
    let (status, body) = send(router(), post_json("/predict", payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_FWI"], json!(REFERENCE_PREDICTION));
}

#[tokio::test]
async fn missing_feature_is_a_client_error() {
    let mut features = reference_features();
    features.remove("BUI");
    let payload = Value::Object(features).to_string();
    let (status, body) = send(router(), post_json("/api/predict", payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_only(&body);
    assert!(body["error"].as_str().unwrap_or_default().contains("BUI"));
}

#[tokio::test]
async fn invalid_value_is_a_client_error() {
    let mut features = reference_features();
    features.insert("RH".into(), json!("humid"));
    let payload = Value::Object(features).to_string();
    let (status, body) = send(router(), post_json("/api/predict", payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_only(&body);
}

#[tokio::test]
async fn string_values_from_forms_are_accepted() {
    let features: serde_json::Map<String, Value> = reference_features()
        .into_iter()
        .map(|(name, value)| (name, Value::String(value.to_string())))
        .collect();
    let mut payload = Value::Object(features);
    payload["latitude"] = json!("36.75");
    let (status, body) = send(router(), post_json("/api/predict", payload.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_FWI"], json!(REFERENCE_PREDICTION));
}

#[tokio::test]
async fn malformed_bodies_are_rejected_as_json() {
    for payload in ["", "{not json", "[1, 2, 3]", "null", "42"] {
        let (status, body) = send(router(), post_json("/api/predict", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload:?}");
        assert_error_only(&body);
    }
}

#[tokio::test]
async fn missing_content_type_is_rejected() {
    let request = Request::post("/api/predict")
        .body(Body::from(Value::Object(reference_features()).to_string()))
        .unwrap();
    let (status, body) = send(router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_only(&body);
}

#[tokio::test]
async fn oversized_body_is_rejected_as_json() {
    let mut payload = Value::Object(reference_features());
    payload["padding"] = json!("x".repeat(BODY_LIMIT + 1));
    let (status, body) = send(router(), post_json("/api/predict", payload.to_string())).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_error_only(&body);
}

#[tokio::test]
async fn transform_failure_is_a_server_error() {
    let mut artifact = sample_artifact();
    artifact.regressor.coefficients.truncate(10);
    let payload = Value::Object(reference_features()).to_string();
    let (status, body) = send(router_for(artifact), post_json("/api/predict", payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_only(&body);
}

#[tokio::test]
async fn huge_prediction_is_still_a_number() {
    let mut artifact = sample_artifact();
    artifact.regressor.intercept = 1.0e308;
    let payload = Value::Object(reference_features()).to_string();
    let (status, body) = send(router_for(artifact), post_json("/api/predict", payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_FWI"].as_f64(), Some(1.0e308), "body: {body}");
}

#[tokio::test]
async fn health_reports_feature_contract() {
    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["regressor"], "ridge");
    assert_eq!(body["feature_names"].as_array().map(Vec::len), Some(12));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/predict")
        .header(header::ORIGIN, "http://localhost:8501")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let allowed = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok());
    assert_eq!(allowed, Some("*"));
}

#[test]
fn startup_fails_without_artifact() {
    let dir = TempDir::new().unwrap();
    let config = ApiConfig {
        artifact_path: dir.path().join("missing.json"),
        ..ApiConfig::default()
    };
    assert!(matches!(load_state(&config), Err(FwiError::ArtifactLoad(_))));
}

#[test]
fn startup_fails_on_corrupt_artifact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("active.json");
    std::fs::write(&path, "{\"feature_names\": [\"day\"]}").unwrap();
    let config = ApiConfig {
        artifact_path: path,
        ..ApiConfig::default()
    };
    assert!(matches!(load_state(&config), Err(FwiError::ArtifactLoad(_))));
}

#[tokio::test]
async fn startup_loads_saved_artifact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("active.json");
    sample_artifact().save(&path).unwrap();
    let config = ApiConfig {
        artifact_path: path,
        require_hash: true,
        ..ApiConfig::default()
    };

    let state = load_state(&config).unwrap();
    let app = build_router(Arc::new(state), BODY_LIMIT);
    let payload = Value::Object(reference_features()).to_string();
    let (status, body) = send(app, post_json("/api/predict", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_FWI"], json!(REFERENCE_PREDICTION));
}
