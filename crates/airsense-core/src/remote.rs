//! Remote model adapter with a transparent local fallback.
//!
//! Builds the seven-feature request, bounds the call with a timeout and
//! reconciles the returned label with [`Category`]. When the model cannot
//! answer, the breakpoint classifier answers instead and the result still
//! reports [`ClassificationMethod::ModelBased`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use airsense_core::{MockInferenceClient, RemoteClassifier, ThresholdClassifier};
//! use airsense_core::inference::InferenceOutcome;
//! use airsense_types::{Category, ClassificationMethod, Pollutant, PollutantVector};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = Arc::new(MockInferenceClient::new());
//! client.set_default(InferenceOutcome::FallbackRequested("offline".into()));
//!
//! let remote = RemoteClassifier::new(client, ThresholdClassifier::default());
//! let vector = PollutantVector::new().with(Pollutant::Pm10, 200.0);
//! let result = remote.classify(&vector).await;
//!
//! assert_eq!(result.category, Category::UnhealthyForSensitive);
//! assert_eq!(result.method, ClassificationMethod::ModelBased);
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use airsense_types::{
    Category, ClassificationMethod, ClassificationResult, InputSnapshot, Pollutant,
    PollutantVector,
};

use crate::breakpoints::ThresholdClassifier;
use crate::inference::{
    FEATURE_COUNT, InferenceClient, InferenceError, InferenceOutcome, InferenceRequest,
};

/// Default bound on one inference call.
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Confidence reported when the model omits one.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.95;

/// Classifier backed by a remote model.
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: Arc<dyn InferenceClient>,
    fallback: ThresholdClassifier,
    timeout: Duration,
    default_confidence: f64,
}

impl RemoteClassifier {
    /// Create an adapter around an inference client.
    pub fn new(client: Arc<dyn InferenceClient>, fallback: ThresholdClassifier) -> Self {
        Self {
            client,
            fallback,
            timeout: DEFAULT_INFERENCE_TIMEOUT,
            default_confidence: DEFAULT_MODEL_CONFIDENCE,
        }
    }

    /// Set the call timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the confidence used when the model omits one.
    #[must_use]
    pub fn default_confidence(mut self, confidence: f64) -> Self {
        self.default_confidence = confidence;
        self
    }

    /// Build the request for a vector.
    ///
    /// Absent and non-finite pollutants become 0. The seventh feature is the
    /// vector's own `max` if present, otherwise the composite severity.
    #[must_use]
    pub fn feature_vector(&self, vector: &PollutantVector) -> InferenceRequest {
        let mut features = [0.0; FEATURE_COUNT];
        for (slot, pollutant) in features.iter_mut().zip(Pollutant::ALL) {
            *slot = finite_or_zero(vector.get(pollutant));
        }
        features[FEATURE_COUNT - 1] = match vector.max {
            Some(max) if max.is_finite() => max,
            _ => f64::from(self.fallback.composite_severity(vector)),
        };
        InferenceRequest::new(features)
    }

    /// Classify a vector through the model, falling back to local rules.
    pub async fn classify(&self, vector: &PollutantVector) -> ClassificationResult {
        let request = self.feature_vector(vector);
        debug!(features = ?request.features, "Requesting model prediction");

        let outcome = match tokio::time::timeout(self.timeout, self.client.predict(&request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => InferenceOutcome::TransportError(InferenceError::Timeout(self.timeout)),
        };

        match outcome {
            InferenceOutcome::Prediction(prediction) => {
                let category = normalize_label(&prediction.label);
                let confidence = prediction.confidence.unwrap_or(self.default_confidence);
                debug!(label = %prediction.label, category = %category, confidence, "Model prediction");
                ClassificationResult::new(
                    category,
                    Some(confidence),
                    ClassificationMethod::ModelBased,
                    InputSnapshot::Pollutants(*vector),
                )
            }
            InferenceOutcome::FallbackRequested(reason) => {
                warn!(%reason, "Model requested fallback, using breakpoint rules");
                self.fall_back(vector)
            }
            InferenceOutcome::TransportError(error) => {
                warn!(%error, "Model unavailable, using breakpoint rules");
                self.fall_back(vector)
            }
        }
    }

    fn fall_back(&self, vector: &PollutantVector) -> ClassificationResult {
        ClassificationResult {
            method: ClassificationMethod::ModelBased,
            ..self.fallback.classify(vector)
        }
    }
}

/// Map a model label onto a category.
///
/// Unrecognised labels map to [`Category::Moderate`].
///
/// ```
/// use airsense_core::remote::normalize_label;
/// use airsense_types::Category;
///
/// assert_eq!(normalize_label("SANGAT_TIDAK_SEHAT"), Category::VeryUnhealthy);
/// assert_eq!(normalize_label("very unhealthy"), Category::VeryUnhealthy);
/// assert_eq!(normalize_label("???"), Category::Moderate);
/// ```
#[must_use]
pub fn normalize_label(label: &str) -> Category {
    Category::from_label(label).unwrap_or_else(|| {
        warn!(label, "Unrecognised model label, defaulting to Moderate");
        Category::Moderate
    })
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoints;
    use crate::inference::Prediction;
    use crate::mock::MockInferenceClient;

    fn vector() -> PollutantVector {
        PollutantVector::new()
            .with(Pollutant::Pm10, 45.0)
            .with(Pollutant::Pm25, 60.0)
            .with(Pollutant::Co, 2.5)
    }

    fn remote(client: &Arc<MockInferenceClient>) -> RemoteClassifier {
        RemoteClassifier::new(client.clone(), ThresholdClassifier::default())
    }

    fn prediction(label: &str, confidence: Option<f64>) -> InferenceOutcome {
        InferenceOutcome::Prediction(Prediction {
            label: label.to_string(),
            confidence,
        })
    }

    #[test]
    fn test_feature_vector_order_and_zero_fill() {
        let client = Arc::new(MockInferenceClient::new());
        let request = remote(&client).feature_vector(&vector());
        // PM2.5 at 60 is index 2
        assert_eq!(request.features, [45.0, 60.0, 0.0, 2.5, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_feature_vector_keeps_supplied_max() {
        let client = Arc::new(MockInferenceClient::new());
        let request = remote(&client).feature_vector(&vector().with_max(4.0));
        assert_eq!(request.features[6], 4.0);
    }

    #[test]
    fn test_feature_vector_non_finite_becomes_zero() {
        let client = Arc::new(MockInferenceClient::new());
        let v = PollutantVector::new()
            .with(Pollutant::O3, f64::NAN)
            .with_max(f64::INFINITY);
        let request = remote(&client).feature_vector(&v);
        assert_eq!(request.features, [0.0; 7]);
    }

    #[tokio::test]
    async fn test_prediction_is_normalized() {
        let client = Arc::new(MockInferenceClient::new());
        client.push(prediction("TIDAK_SEHAT", Some(0.81)));

        let result = remote(&client).classify(&vector()).await;
        assert_eq!(result.category, Category::UnhealthyForSensitive);
        assert_eq!(result.confidence, Some(0.81));
        assert_eq!(result.method, ClassificationMethod::ModelBased);
        assert_eq!(client.call_count(), 1);
        assert_eq!(
            client.last_request().map(|r| r.features),
            Some([45.0, 60.0, 0.0, 2.5, 0.0, 0.0, 2.0])
        );
    }

    #[tokio::test]
    async fn test_missing_confidence_uses_default() {
        let client = Arc::new(MockInferenceClient::new());
        client.push(prediction("BAIK", None));
        let result = remote(&client).classify(&vector()).await;
        assert_eq!(result.confidence, Some(0.95));

        client.push(prediction("BAIK", None));
        let result = remote(&client)
            .default_confidence(0.5)
            .classify(&vector())
            .await;
        assert_eq!(result.confidence, Some(0.5));
    }

    #[tokio::test]
    async fn test_unknown_label_defaults_to_moderate() {
        let client = Arc::new(MockInferenceClient::new());
        client.push(prediction("PURPLE", Some(0.6)));
        let result = remote(&client).classify(&vector()).await;
        assert_eq!(result.category, Category::Moderate);
        assert_eq!(result.confidence, Some(0.6));
    }

    #[tokio::test]
    async fn test_fallback_flag_matches_breakpoint_classifier() {
        let client = Arc::new(MockInferenceClient::new());
        client.push(InferenceOutcome::FallbackRequested("useFallback".into()));

        let v = vector();
        let result = remote(&client).classify(&v).await;
        let local = breakpoints::classify(&v);
        assert_eq!(result.category, local.category);
        assert_eq!(result.confidence, local.confidence);
        assert_eq!(result.method, ClassificationMethod::ModelBased);
    }

    #[tokio::test]
    async fn test_transport_errors_fall_back() {
        let client = Arc::new(MockInferenceClient::new());
        client.push(InferenceOutcome::TransportError(InferenceError::Status {
            status: 500,
            message: "boom".into(),
        }));
        client.push(InferenceOutcome::TransportError(InferenceError::Malformed(
            "no category".into(),
        )));
        let adapter = remote(&client);
        let expected = breakpoints::classify(&vector()).category;

        for _ in 0..2 {
            let result = adapter.classify(&vector()).await;
            assert_eq!(result.category, expected);
            assert_eq!(result.method, ClassificationMethod::ModelBased);
        }
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let client = Arc::new(MockInferenceClient::new());
        client.set_latency(Duration::from_secs(30));
        client.push(prediction("BERBAHAYA", Some(0.99)));

        let result = remote(&client)
            .timeout(Duration::from_secs(1))
            .classify(&vector())
            .await;
        assert_eq!(result.category, breakpoints::classify(&vector()).category);
        assert_eq!(result.method, ClassificationMethod::ModelBased);
    }

    #[test]
    fn test_normalize_label_variants() {
        assert_eq!(normalize_label("GOOD"), Category::Good);
        assert_eq!(normalize_label("unhealthy_for_sensitive"), Category::UnhealthyForSensitive);
        assert_eq!(normalize_label("Berbahaya"), Category::Hazardous);
        assert_eq!(normalize_label(""), Category::Moderate);
    }
}
