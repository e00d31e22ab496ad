//! Gas-index classifier for the local IoT sensor node.
//!
//! The MQ-135 gas index cannot tell the two most severe tiers apart, so
//! only `Good`, `Moderate` and `UnhealthyForSensitive` are reachable here.

use serde::{Deserialize, Serialize};

use airsense_types::{Category, ClassificationMethod, ClassificationResult, InputSnapshot, IoTReading};

use crate::config::ValidationError;

/// Cutoffs and confidences for the gas-index classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IotThresholds {
    /// Gas index at which the category becomes `Moderate`.
    pub moderate_from: f64,
    /// Gas index at which the category becomes `UnhealthyForSensitive`.
    pub unhealthy_from: f64,
    /// Confidence reported for `Good`.
    pub good_confidence: f64,
    /// Confidence reported for `Moderate`.
    pub moderate_confidence: f64,
    /// Confidence reported for `UnhealthyForSensitive`.
    pub unhealthy_confidence: f64,
}

impl Default for IotThresholds {
    fn default() -> Self {
        Self {
            moderate_from: 100.0,
            unhealthy_from: 200.0,
            good_confidence: 0.95,
            moderate_confidence: 0.90,
            unhealthy_confidence: 0.85,
        }
    }
}

impl IotThresholds {
    /// Validate cutoffs and confidences.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.moderate_from.is_finite() || self.moderate_from <= 0.0 {
            errors.push(ValidationError {
                field: "iot.moderate_from".to_string(),
                message: format!("must be a positive number, got {}", self.moderate_from),
            });
        }
        if !self.unhealthy_from.is_finite() || self.unhealthy_from <= self.moderate_from {
            errors.push(ValidationError {
                field: "iot.unhealthy_from".to_string(),
                message: format!(
                    "must be greater than moderate_from ({}), got {}",
                    self.moderate_from, self.unhealthy_from
                ),
            });
        }

        for (field, value) in [
            ("iot.good_confidence", self.good_confidence),
            ("iot.moderate_confidence", self.moderate_confidence),
            ("iot.unhealthy_confidence", self.unhealthy_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("confidence {} must be between 0 and 1", value),
                });
            }
        }

        errors
    }
}

/// Threshold classifier over the IoT gas index.
#[derive(Debug, Clone, Default)]
pub struct IotClassifier {
    thresholds: IotThresholds,
}

impl IotClassifier {
    /// Create a classifier with custom cutoffs.
    #[must_use]
    pub fn new(thresholds: IotThresholds) -> Self {
        Self { thresholds }
    }

    /// The cutoffs in use.
    #[must_use]
    pub fn thresholds(&self) -> &IotThresholds {
        &self.thresholds
    }

    /// Category and confidence for a bare gas index.
    ///
    /// A NaN index scores as `Good`.
    #[must_use]
    pub fn evaluate(&self, gas_index: f64) -> (Category, f64) {
        let t = &self.thresholds;
        if gas_index >= t.unhealthy_from {
            (Category::UnhealthyForSensitive, t.unhealthy_confidence)
        } else if gas_index >= t.moderate_from {
            (Category::Moderate, t.moderate_confidence)
        } else {
            (Category::Good, t.good_confidence)
        }
    }

    /// Classify a sensor reading.
    ///
    /// ```
    /// use airsense_core::IotClassifier;
    /// use airsense_types::{Category, IoTReading};
    ///
    /// let classifier = IotClassifier::default();
    /// let result = classifier.classify(&IoTReading::new(150.0));
    /// assert_eq!(result.category, Category::Moderate);
    /// assert_eq!(result.method_label(), "Sensor threshold");
    /// ```
    #[must_use]
    pub fn classify(&self, reading: &IoTReading) -> ClassificationResult {
        let (category, confidence) = self.evaluate(reading.gas_index);
        tracing::debug!(gas_index = reading.gas_index, category = %category, "Gas index classification");
        ClassificationResult::new(
            category,
            Some(confidence),
            ClassificationMethod::RuleBased,
            InputSnapshot::GasIndex(*reading),
        )
    }
}

/// Classify a gas index with the default cutoffs.
#[must_use]
pub fn classify_iot(gas_index: f64) -> ClassificationResult {
    IotClassifier::default().classify(&IoTReading::new(gas_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cutoffs() {
        assert_eq!(classify_iot(0.0).category, Category::Good);
        assert_eq!(classify_iot(99.0).category, Category::Good);
        assert_eq!(classify_iot(100.0).category, Category::Moderate);
        assert_eq!(classify_iot(199.0).category, Category::Moderate);
        assert_eq!(classify_iot(200.0).category, Category::UnhealthyForSensitive);
        assert_eq!(classify_iot(5000.0).category, Category::UnhealthyForSensitive);
    }

    #[test]
    fn test_confidences() {
        assert_eq!(classify_iot(10.0).confidence, Some(0.95));
        assert_eq!(classify_iot(150.0).confidence, Some(0.90));
        assert_eq!(classify_iot(250.0).confidence, Some(0.85));
    }

    #[test]
    fn test_method_is_rule_based_sensor_threshold() {
        let result = classify_iot(42.0);
        assert_eq!(result.method, ClassificationMethod::RuleBased);
        assert_eq!(result.method_label(), "Sensor threshold");
        assert!(matches!(result.input, InputSnapshot::GasIndex(r) if r.gas_index == 42.0));
    }

    #[test]
    fn test_environment_values_do_not_affect_category() {
        let classifier = IotClassifier::default();
        let mut reading = IoTReading::new(120.0);
        reading.temperature = Some(45.0);
        reading.humidity = Some(99.0);
        reading.pressure = Some(900.0);
        assert_eq!(classifier.classify(&reading).category, Category::Moderate);
    }

    #[test]
    fn test_nan_is_good() {
        assert_eq!(classify_iot(f64::NAN).category, Category::Good);
    }

    #[test]
    fn test_custom_cutoffs() {
        let classifier = IotClassifier::new(IotThresholds {
            moderate_from: 50.0,
            unhealthy_from: 80.0,
            ..IotThresholds::default()
        });
        assert_eq!(classifier.evaluate(60.0).0, Category::Moderate);
        assert_eq!(classifier.evaluate(80.0).0, Category::UnhealthyForSensitive);
    }

    #[test]
    fn test_validate() {
        assert!(IotThresholds::default().validate().is_empty());

        let bad = IotThresholds {
            moderate_from: 200.0,
            unhealthy_from: 100.0,
            good_confidence: 1.5,
            ..IotThresholds::default()
        };
        let errors = bad.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "iot.unhealthy_from"));
        assert!(errors.iter().any(|e| e.field == "iot.good_confidence"));
    }

    proptest! {
        #[test]
        fn prop_only_three_categories_reachable(g in 0.0f64..100_000.0) {
            let category = classify_iot(g).category;
            prop_assert!(category <= Category::UnhealthyForSensitive);
        }

        #[test]
        fn prop_monotonic(a in 0.0f64..1000.0, b in 0.0f64..1000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify_iot(lo).category <= classify_iot(hi).category);
        }
    }
}
