use crate::errors::{ClientError, Result};
use crate::observation::{PredictResponse, Prediction, WeatherObservation};
use tracing::debug;

/// HTTP client for the prediction API.
#[derive(Clone, Debug)]
pub struct FwiClient {
    client: reqwest::Client,
    base_url: String,
}

impl FwiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Submit one observation to `/api/predict`.
    pub async fn predict(&self, observation: &WeatherObservation) -> Result<Prediction> {
        let url = self.endpoint("api/predict");
        debug!(%url, "requesting prediction");

        let response = self.client.post(url).json(observation).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<PredictResponse>(&body) {
            Ok(PredictResponse::Success { predicted_fwi }) if status.is_success() => {
                Ok(Prediction::new(predicted_fwi))
            }
            Ok(PredictResponse::Failure { error }) => Err(ClientError::Server {
                status: status.as_u16(),
                message: error,
            }),
            _ if !status.is_success() => Err(ClientError::Server {
                status: status.as_u16(),
                message: body,
            }),
            _ => Err(ClientError::UnexpectedResponse(body)),
        }
    }
}
