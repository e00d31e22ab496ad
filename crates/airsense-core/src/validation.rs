//! Validation and bounds checking for incoming readings.
//!
//! Negative or non-finite values make a reading invalid. Values far beyond
//! anything a provider has plausibly reported only produce warnings; the
//! reading is still classified.
//!
//! # Example
//!
//! ```
//! use airsense_core::ReadingValidator;
//! use airsense_core::monitor::Reading;
//! use airsense_types::{DataSource, Pollutant, PollutantVector};
//!
//! let validator = ReadingValidator::default();
//!
//! let reading = Reading::from_pollutants(
//!     DataSource::OpenAq,
//!     PollutantVector::new().with(Pollutant::Pm25, 35.0),
//! );
//! let result = validator.validate(&reading);
//! assert!(result.is_valid);
//! assert!(!result.has_warnings());
//! ```

use serde::{Deserialize, Serialize};

use airsense_types::{IoTReading, Pollutant, PollutantVector};

use crate::monitor::Reading;

/// Warning types for validation issues.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new warning types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValidationWarning {
    /// A pollutant concentration is negative.
    Negative { pollutant: Pollutant, value: f64 },
    /// A pollutant concentration is NaN or infinite.
    NonFinite { pollutant: Pollutant },
    /// A pollutant concentration is above any plausible value.
    ImplausiblyHigh {
        pollutant: Pollutant,
        value: f64,
        max: f64,
    },
    /// The gas index is negative.
    GasIndexNegative { value: f64 },
    /// The gas index is NaN or infinite.
    GasIndexNonFinite,
    /// The gas index is above the sensor's usable range.
    GasIndexTooHigh { value: f64, max: f64 },
    /// Temperature is outside the expected range.
    TemperatureOutOfRange { value: f64, min: f64, max: f64 },
    /// Humidity is outside 0-100%.
    HumidityOutOfRange { value: f64 },
}

impl ValidationWarning {
    /// Whether this warning makes the reading unusable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ValidationWarning::Negative { .. }
                | ValidationWarning::NonFinite { .. }
                | ValidationWarning::GasIndexNegative { .. }
                | ValidationWarning::GasIndexNonFinite
        )
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::Negative { pollutant, value } => {
                write!(f, "{} {} {} is negative", pollutant, value, pollutant.unit())
            }
            ValidationWarning::NonFinite { pollutant } => {
                write!(f, "{} is not a finite number", pollutant)
            }
            ValidationWarning::ImplausiblyHigh {
                pollutant,
                value,
                max,
            } => write!(
                f,
                "{} {} {} exceeds plausible maximum {} {}",
                pollutant,
                value,
                pollutant.unit(),
                max,
                pollutant.unit()
            ),
            ValidationWarning::GasIndexNegative { value } => {
                write!(f, "Gas index {} is negative", value)
            }
            ValidationWarning::GasIndexNonFinite => {
                write!(f, "Gas index is not a finite number")
            }
            ValidationWarning::GasIndexTooHigh { value, max } => {
                write!(f, "Gas index {} exceeds maximum {}", value, max)
            }
            ValidationWarning::TemperatureOutOfRange { value, min, max } => {
                write!(
                    f,
                    "Temperature {}°C is outside expected range {}°C to {}°C",
                    value, min, max
                )
            }
            ValidationWarning::HumidityOutOfRange { value } => {
                write!(f, "Humidity {}% is out of valid range (0-100)", value)
            }
        }
    }
}

/// Result of validating a reading.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the reading passed validation.
    pub is_valid: bool,
    /// List of warnings (may be non-empty even if valid).
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    fn from_warnings(warnings: Vec<ValidationWarning>) -> Self {
        Self {
            is_valid: !warnings.iter().any(ValidationWarning::is_fatal),
            warnings,
        }
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Upper bounds beyond which values are flagged as implausible.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// PM10 in µg/m³.
    pub pm10_max: f64,
    /// PM2.5 in µg/m³.
    pub pm25_max: f64,
    /// SO₂ in µg/m³.
    pub so2_max: f64,
    /// CO in mg/m³.
    pub co_max: f64,
    /// O₃ in µg/m³.
    pub o3_max: f64,
    /// NO₂ in µg/m³.
    pub no2_max: f64,
    /// Highest gas index the sensor can produce.
    pub gas_index_max: f64,
    /// Minimum expected temperature (°C).
    pub temperature_min: f64,
    /// Maximum expected temperature (°C).
    pub temperature_max: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            pm10_max: 2000.0,
            pm25_max: 1000.0,
            so2_max: 3000.0,
            co_max: 150.0,
            o3_max: 1500.0,
            no2_max: 2500.0,
            gas_index_max: 1000.0,
            temperature_min: -20.0,
            temperature_max: 60.0,
        }
    }
}

impl ValidatorConfig {
    fn max_for(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Pm10 => self.pm10_max,
            Pollutant::Pm25 => self.pm25_max,
            Pollutant::So2 => self.so2_max,
            Pollutant::Co => self.co_max,
            Pollutant::O3 => self.o3_max,
            Pollutant::No2 => self.no2_max,
        }
    }
}

/// Validator for incoming readings.
#[derive(Debug, Clone, Default)]
pub struct ReadingValidator {
    config: ValidatorConfig,
}

impl ReadingValidator {
    /// Create a validator with the given configuration.
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Get the validator configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a whole reading.
    pub fn validate(&self, reading: &Reading) -> ValidationResult {
        let mut warnings = Vec::new();
        if let Some(pollutants) = &reading.pollutants {
            warnings.extend(self.check_pollutants(pollutants));
        }
        if let Some(iot) = &reading.iot {
            warnings.extend(self.check_iot(iot));
        }
        ValidationResult::from_warnings(warnings)
    }

    /// Validate a pollutant vector on its own.
    pub fn validate_pollutants(&self, pollutants: &PollutantVector) -> ValidationResult {
        ValidationResult::from_warnings(self.check_pollutants(pollutants))
    }

    /// Validate an IoT reading on its own.
    pub fn validate_iot(&self, iot: &IoTReading) -> ValidationResult {
        ValidationResult::from_warnings(self.check_iot(iot))
    }

    fn check_pollutants(&self, pollutants: &PollutantVector) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for (pollutant, value) in pollutants.present() {
            if !value.is_finite() {
                warnings.push(ValidationWarning::NonFinite { pollutant });
            } else if value < 0.0 {
                warnings.push(ValidationWarning::Negative { pollutant, value });
            } else {
                let max = self.config.max_for(pollutant);
                if value > max {
                    warnings.push(ValidationWarning::ImplausiblyHigh {
                        pollutant,
                        value,
                        max,
                    });
                }
            }
        }
        warnings
    }

    fn check_iot(&self, iot: &IoTReading) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let gas = iot.gas_index;
        if !gas.is_finite() {
            warnings.push(ValidationWarning::GasIndexNonFinite);
        } else if gas < 0.0 {
            warnings.push(ValidationWarning::GasIndexNegative { value: gas });
        } else if gas > self.config.gas_index_max {
            warnings.push(ValidationWarning::GasIndexTooHigh {
                value: gas,
                max: self.config.gas_index_max,
            });
        }

        if let Some(temp) = iot.temperature
            && !(self.config.temperature_min..=self.config.temperature_max).contains(&temp)
        {
            warnings.push(ValidationWarning::TemperatureOutOfRange {
                value: temp,
                min: self.config.temperature_min,
                max: self.config.temperature_max,
            });
        }

        if let Some(humidity) = iot.humidity
            && !(0.0..=100.0).contains(&humidity)
        {
            warnings.push(ValidationWarning::HumidityOutOfRange { value: humidity });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsense_types::DataSource;

    #[test]
    fn test_valid_pollutants() {
        let validator = ReadingValidator::default();
        let v = PollutantVector::new()
            .with(Pollutant::Pm10, 45.0)
            .with(Pollutant::Co, 0.0);
        let result = validator.validate_pollutants(&v);
        assert!(result.is_valid);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_empty_vector_is_valid() {
        let result = ReadingValidator::default().validate_pollutants(&PollutantVector::new());
        assert!(result.is_valid);
    }

    #[test]
    fn test_negative_is_invalid() {
        let v = PollutantVector::new().with(Pollutant::So2, -3.0);
        let result = ReadingValidator::default().validate_pollutants(&v);
        assert!(!result.is_valid);
        assert_eq!(
            result.warnings,
            vec![ValidationWarning::Negative {
                pollutant: Pollutant::So2,
                value: -3.0
            }]
        );
    }

    #[test]
    fn test_non_finite_is_invalid() {
        let v = PollutantVector::new().with(Pollutant::O3, f64::INFINITY);
        let result = ReadingValidator::default().validate_pollutants(&v);
        assert!(!result.is_valid);
        assert!(matches!(
            result.warnings[0],
            ValidationWarning::NonFinite {
                pollutant: Pollutant::O3
            }
        ));
    }

    #[test]
    fn test_implausibly_high_is_only_a_warning() {
        let v = PollutantVector::new().with(Pollutant::Pm25, 5000.0);
        let result = ReadingValidator::default().validate_pollutants(&v);
        assert!(result.is_valid);
        assert!(result.has_warnings());
        assert!(!result.warnings[0].is_fatal());
    }

    #[test]
    fn test_gas_index_checks() {
        let validator = ReadingValidator::default();
        assert!(validator.validate_iot(&IoTReading::new(150.0)).is_valid);
        assert!(!validator.validate_iot(&IoTReading::new(-1.0)).is_valid);
        assert!(!validator.validate_iot(&IoTReading::new(f64::NAN)).is_valid);

        let high = validator.validate_iot(&IoTReading::new(5000.0));
        assert!(high.is_valid);
        assert!(high.has_warnings());
    }

    #[test]
    fn test_environment_checks_are_warnings() {
        let mut reading = IoTReading::new(50.0);
        reading.temperature = Some(85.0);
        reading.humidity = Some(120.0);
        let result = ReadingValidator::default().validate_iot(&reading);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_validate_whole_reading() {
        let reading = Reading::from_pollutants(
            DataSource::OpenWeatherMap,
            PollutantVector::new().with(Pollutant::No2, -5.0),
        );
        let result = ReadingValidator::default().validate(&reading);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_custom_config() {
        let validator = ReadingValidator::new(ValidatorConfig {
            pm10_max: 100.0,
            ..ValidatorConfig::default()
        });
        let v = PollutantVector::new().with(Pollutant::Pm10, 150.0);
        assert!(validator.validate_pollutants(&v).has_warnings());
        assert_eq!(validator.config().pm10_max, 100.0);
    }

    #[test]
    fn test_warning_display() {
        let w = ValidationWarning::Negative {
            pollutant: Pollutant::Co,
            value: -1.0,
        };
        assert_eq!(w.to_string(), "CO -1 mg/m³ is negative");
        assert_eq!(
            ValidationWarning::GasIndexNonFinite.to_string(),
            "Gas index is not a finite number"
        );
    }
}
