//! Client for the Fire Weather Index prediction API
//!
//! Sends one observation per call and reports the predicted index with its
//! danger band.

pub mod client;
pub mod errors;
pub mod observation;

pub use client::FwiClient;
pub use errors::ClientError;
pub use observation::{PredictResponse, Prediction, WeatherObservation};
