//! Request and response shapes of the prediction endpoint

use fwi_core::RiskLevel;
use serde::{Deserialize, Serialize};

/// One day of weather readings and fuel moisture codes.
///
/// Fields serialize under the names the service expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "RH")]
    pub relative_humidity: f64,
    #[serde(rename = "Ws")]
    pub wind_speed: f64,
    #[serde(rename = "Rain")]
    pub rain: f64,
    #[serde(rename = "FFMC")]
    pub ffmc: f64,
    #[serde(rename = "DMC")]
    pub dmc: f64,
    #[serde(rename = "DC")]
    pub dc: f64,
    #[serde(rename = "ISI")]
    pub isi: f64,
    #[serde(rename = "BUI")]
    pub bui: f64,
}

impl Default for WeatherObservation {
    fn default() -> Self {
        Self {
            day: 15,
            month: 7,
            year: 2012,
            temperature: 30.0,
            relative_humidity: 40.0,
            wind_speed: 6.0,
            rain: 0.0,
            ffmc: 85.0,
            dmc: 25.0,
            dc: 60.0,
            isi: 5.0,
            bui: 30.0,
        }
    }
}

/// Either body the endpoint can return
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Success {
        #[serde(rename = "predicted_FWI")]
        predicted_fwi: f64,
    },
    Failure {
        error: String,
    },
}

/// A successful prediction with its danger band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub value: f64,
    pub risk: RiskLevel,
}

impl Prediction {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            risk: RiskLevel::from_fwi(value),
        }
    }
}
