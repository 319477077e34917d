#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the external crime prediction service.
//!
//! The service fits yearly incident totals and answers
//! `GET /predict?year=YYYY` with `{"year": YYYY, "predicted_incidents": N}`.
//! Failures are returned as-is; nothing here retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from prediction requests.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("Prediction service returned {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Error text from the response body.
        message: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Connection settings for the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Service base URL (e.g. `"http://localhost:5001"`).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Predicted incident count for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Year the prediction is for.
    pub year: i32,
    /// Predicted number of incidents.
    pub predicted_incidents: i64,
}

/// HTTP client for the prediction service.
pub struct PredictionClient {
    client: reqwest::Client,
    base_url: String,
}

impl PredictionClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &PredictionConfig) -> Result<Self, PredictionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Asks the service for the predicted incident count in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError`] if the request fails, the service
    /// answers with an error status, or the body lacks a prediction.
    pub async fn predict_incidents(&self, year: i32) -> Result<Prediction, PredictionError> {
        let url = format!("{}/predict", self.base_url);
        log::debug!("Requesting incident prediction for {year} from {url}");

        let resp = self
            .client
            .get(&url)
            .query(&[("year", year)])
            .send()
            .await?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);

        if !status.is_success() {
            return Err(PredictionError::Service {
                status: status.as_u16(),
                message: body["error"]
                    .as_str()
                    .unwrap_or("no error message")
                    .to_string(),
            });
        }

        parse_response(&body, year)
    }
}

/// Parses a prediction response, falling back to `requested_year` when the
/// service omits the year.
fn parse_response(
    body: &serde_json::Value,
    requested_year: i32,
) -> Result<Prediction, PredictionError> {
    if let Some(error) = body["error"].as_str() {
        return Err(PredictionError::Parse {
            message: error.to_string(),
        });
    }

    let predicted = &body["predicted_incidents"];
    #[allow(clippy::cast_possible_truncation)]
    let predicted_incidents = predicted
        .as_i64()
        .or_else(|| predicted.as_f64().map(|v| v.round() as i64))
        .ok_or_else(|| PredictionError::Parse {
            message: "Missing predicted_incidents in prediction response".to_string(),
        })?;

    let year = body["year"]
        .as_i64()
        .and_then(|y| i32::try_from(y).ok())
        .unwrap_or(requested_year);

    Ok(Prediction {
        year,
        predicted_incidents,
    })
}
