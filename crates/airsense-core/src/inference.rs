//! Contract and HTTP client for the remote inference service.
//!
//! The service takes seven ordered features and answers with a category
//! label, an explicit error or a request to fall back to local rules.
//! Every response shape is folded into [`InferenceOutcome`] at this
//! boundary so callers match on a closed set of cases.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use airsense_core::inference::{HttpInferenceClient, InferenceClient, InferenceRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpInferenceClient::new(
//!     "https://inference.example.com/predict",
//!     Duration::from_secs(10),
//! )?;
//! let request = InferenceRequest::new([45.0, 25.0, 30.0, 2.5, 40.0, 20.0, 1.0]);
//! let outcome = client.predict(&request).await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of features sent to the model: six pollutants plus the composite.
pub const FEATURE_COUNT: usize = 7;

/// Request body: `[PM10, PM2.5, SO2, CO, O3, NO2, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Ordered feature values.
    pub features: [f64; FEATURE_COUNT],
}

impl InferenceRequest {
    /// Wrap a feature array.
    #[must_use]
    pub fn new(features: [f64; FEATURE_COUNT]) -> Self {
        Self { features }
    }
}

/// A successful model answer before label normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Raw label as returned by the model.
    pub label: String,
    /// Confidence, if the model reported one.
    pub confidence: Option<f64>,
}

/// Errors on the way to or from the inference service.
///
/// These never reach a caller of the classifier; the remote adapter turns
/// every one of them into a local fallback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum InferenceError {
    /// The service could not be reached.
    #[error("Inference service not reachable at {url}: {message}")]
    NotReachable { url: String, message: String },

    /// The call did not finish in time.
    #[error("Inference call timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("Inference service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the contract.
    #[error("Malformed inference response: {0}")]
    Malformed(String),
}

/// Every way an inference call can end.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    /// The model produced a label.
    Prediction(Prediction),
    /// The service asked the caller to use local rules.
    FallbackRequested(String),
    /// The call failed.
    TransportError(InferenceError),
}

/// A remote classifier reachable over some transport.
#[async_trait]
pub trait InferenceClient: Send + Sync + fmt::Debug {
    /// Run one prediction. Implementations make a single attempt.
    async fn predict(&self, request: &InferenceRequest) -> InferenceOutcome;
}

/// Raw response body as the service sends it.
///
/// Both `category`/`prediction` and `confidence`/`probability` spellings
/// are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInferenceResponse {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "useFallback", alias = "use_fallback")]
    pub use_fallback: Option<bool>,
}

impl RawInferenceResponse {
    /// Fold the body into an outcome.
    ///
    /// The fallback flag wins over an error field, which wins over a label.
    #[must_use]
    pub fn into_outcome(self) -> InferenceOutcome {
        if self.use_fallback == Some(true) {
            let reason = self
                .error
                .unwrap_or_else(|| "service requested fallback".to_string());
            return InferenceOutcome::FallbackRequested(reason);
        }
        if let Some(error) = self.error {
            return InferenceOutcome::FallbackRequested(error);
        }

        let Some(label) = self.category.or(self.prediction).filter(|l| !l.trim().is_empty())
        else {
            return InferenceOutcome::TransportError(InferenceError::Malformed(
                "response carries no category".to_string(),
            ));
        };

        let confidence = self.confidence.or(self.probability);
        if let Some(c) = confidence
            && !(c.is_finite() && (0.0..=1.0).contains(&c))
        {
            return InferenceOutcome::TransportError(InferenceError::Malformed(format!(
                "confidence {} is outside [0, 1]",
                c
            )));
        }

        InferenceOutcome::Prediction(Prediction { label, confidence })
    }
}

/// Parse a response body into an outcome.
///
/// Bodies that are not valid JSON objects are malformed.
#[must_use]
pub fn parse_response(body: &str) -> InferenceOutcome {
    match serde_json::from_str::<RawInferenceResponse>(body) {
        Ok(raw) => raw.into_outcome(),
        Err(e) => InferenceOutcome::TransportError(InferenceError::Malformed(e.to_string())),
    }
}

/// Inference client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpInferenceClient {
    /// Create a client for the given endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Full URL of the predict route (e.g. "https://host/predict")
    /// * `timeout` - Request timeout applied by the HTTP client
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(endpoint, client, timeout)
    }

    /// Create a client with a custom reqwest Client.
    ///
    /// `timeout` is only used for reporting; the client's own timeout applies.
    pub fn with_client(endpoint: &str, client: Client, timeout: Duration) -> Result<Self> {
        let endpoint = validate_url(endpoint)?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// The endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn predict(&self, request: &InferenceRequest) -> InferenceOutcome {
        let response = match self.client.post(&self.endpoint).json(request).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return InferenceOutcome::TransportError(InferenceError::Timeout(self.timeout));
            }
            Err(e) => {
                return InferenceOutcome::TransportError(InferenceError::NotReachable {
                    url: self.endpoint.clone(),
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return InferenceOutcome::TransportError(InferenceError::Malformed(e.to_string()));
            }
        };

        if !status.is_success() {
            let message = serde_json::from_str::<RawInferenceResponse>(&body)
                .ok()
                .and_then(|raw| raw.error)
                .unwrap_or(body);
            return InferenceOutcome::TransportError(InferenceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_response(&body)
    }
}

/// Trim a trailing slash and require an http(s) scheme.
pub(crate) fn validate_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/').to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            url
        )));
    }
    Ok(url)
}
