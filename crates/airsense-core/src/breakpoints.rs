//! Breakpoint tables and the worst-pollutant-wins classifier.
//!
//! Each pollutant maps its concentration through an ascending four-entry
//! table to a severity index 0-4. Bounds are inclusive: a value exactly on
//! a breakpoint gets the lower index. The overall category is the one at
//! the highest index across all six pollutants.
//!
//! # Example
//!
//! ```
//! use airsense_core::ThresholdClassifier;
//! use airsense_types::{Category, Pollutant, PollutantVector};
//!
//! let classifier = ThresholdClassifier::default();
//!
//! let clean = classifier.classify(&PollutantVector::new());
//! assert_eq!(clean.category, Category::Good);
//! assert_eq!(clean.confidence, Some(0.95));
//!
//! let smoky = PollutantVector::new().with(Pollutant::Pm25, 999.0);
//! let result = classifier.classify(&smoky);
//! assert_eq!(result.category, Category::Hazardous);
//! assert_eq!(result.confidence, Some(0.74));
//! ```

use serde::{Deserialize, Serialize};

use airsense_types::{
    Category, ClassificationMethod, ClassificationResult, InputSnapshot, Pollutant,
    PollutantVector,
};

use crate::config::ValidationError;

/// Highest severity index; a value above the last breakpoint.
pub const MAX_SEVERITY: u8 = 4;

const BASE_CONFIDENCE: f64 = 0.70;
const AGREEMENT_WEIGHT: f64 = 0.25;

/// Four ascending inclusive upper bounds for severity indices 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakpoints([f64; 4]);

impl Breakpoints {
    /// Create a table from four upper bounds.
    #[must_use]
    pub const fn new(bounds: [f64; 4]) -> Self {
        Self(bounds)
    }

    /// The upper bounds.
    #[must_use]
    pub const fn bounds(&self) -> &[f64; 4] {
        &self.0
    }

    /// Severity index for a value.
    ///
    /// Absent and non-finite values score 0.
    ///
    /// ```
    /// use airsense_core::Breakpoints;
    ///
    /// let table = Breakpoints::new([50.0, 150.0, 350.0, 420.0]);
    /// assert_eq!(table.severity(None), 0);
    /// assert_eq!(table.severity(Some(50.0)), 0);
    /// assert_eq!(table.severity(Some(50.1)), 1);
    /// assert_eq!(table.severity(Some(421.0)), 4);
    /// ```
    #[must_use]
    pub fn severity(&self, value: Option<f64>) -> u8 {
        match value {
            Some(v) if v.is_finite() => self
                .0
                .iter()
                .position(|bound| v <= *bound)
                .map_or(MAX_SEVERITY, |i| i as u8),
            _ => 0,
        }
    }

    fn validate(&self, field: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (i, bound) in self.0.iter().enumerate() {
            if !bound.is_finite() || *bound < 0.0 {
                errors.push(ValidationError {
                    field: format!("{}[{}]", field, i),
                    message: format!("breakpoint {} must be a finite non-negative number", bound),
                });
            }
        }
        if self.0.windows(2).any(|pair| pair[0] >= pair[1]) {
            errors.push(ValidationError {
                field: field.to_string(),
                message: format!("breakpoints {:?} must be strictly ascending", self.0),
            });
        }
        errors
    }
}

/// Breakpoint tables for all six pollutants.
///
/// Defaults follow the ISPU-style tables the dashboard was calibrated
/// against (CO in mg/m³, everything else in µg/m³).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointConfig {
    /// PM10 table.
    pub pm10: Breakpoints,
    /// PM2.5 table.
    pub pm25: Breakpoints,
    /// SO₂ table.
    pub so2: Breakpoints,
    /// CO table.
    pub co: Breakpoints,
    /// O₃ table.
    pub o3: Breakpoints,
    /// NO₂ table.
    pub no2: Breakpoints,
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        Self {
            pm10: Breakpoints::new([50.0, 150.0, 350.0, 420.0]),
            pm25: Breakpoints::new([15.0, 55.0, 150.0, 250.0]),
            so2: Breakpoints::new([50.0, 180.0, 400.0, 800.0]),
            co: Breakpoints::new([4.0, 9.0, 15.0, 30.0]),
            o3: Breakpoints::new([50.0, 100.0, 200.0, 300.0]),
            no2: Breakpoints::new([50.0, 100.0, 200.0, 400.0]),
        }
    }
}

impl BreakpointConfig {
    /// Table for a pollutant.
    #[must_use]
    pub fn table(&self, pollutant: Pollutant) -> &Breakpoints {
        match pollutant {
            Pollutant::Pm10 => &self.pm10,
            Pollutant::Pm25 => &self.pm25,
            Pollutant::So2 => &self.so2,
            Pollutant::Co => &self.co,
            Pollutant::O3 => &self.o3,
            Pollutant::No2 => &self.no2,
        }
    }

    /// Validate every table.
    pub fn validate(&self) -> Vec<ValidationError> {
        Pollutant::ALL
            .iter()
            .flat_map(|p| {
                let field = format!("breakpoints.{}", field_name(*p));
                self.table(*p).validate(&field)
            })
            .collect()
    }
}

fn field_name(pollutant: Pollutant) -> &'static str {
    match pollutant {
        Pollutant::Pm10 => "pm10",
        Pollutant::Pm25 => "pm25",
        Pollutant::So2 => "so2",
        Pollutant::Co => "co",
        Pollutant::O3 => "o3",
        Pollutant::No2 => "no2",
    }
}

/// Rule-based classifier over a pollutant vector.
///
/// Total and deterministic: it never fails and identical inputs give
/// identical categories and confidences.
#[derive(Debug, Clone, Default)]
pub struct ThresholdClassifier {
    config: BreakpointConfig,
}

impl ThresholdClassifier {
    /// Create a classifier with custom tables.
    #[must_use]
    pub fn new(config: BreakpointConfig) -> Self {
        Self { config }
    }

    /// The tables in use.
    #[must_use]
    pub fn config(&self) -> &BreakpointConfig {
        &self.config
    }

    /// Severity index of each pollutant, in feature order.
    #[must_use]
    pub fn severities(&self, vector: &PollutantVector) -> [u8; 6] {
        Pollutant::ALL.map(|p| self.config.table(p).severity(vector.get(p)))
    }

    /// Worst severity index across all pollutants (the composite "MAX" feature).
    #[must_use]
    pub fn composite_severity(&self, vector: &PollutantVector) -> u8 {
        self.severities(vector).into_iter().max().unwrap_or(0)
    }

    /// Classify a pollutant vector.
    ///
    /// Confidence is `0.70 + 0.25 * agreement`, where agreement is the
    /// fraction of pollutants sitting at the winning index, rounded to two
    /// decimals.
    #[must_use]
    pub fn classify(&self, vector: &PollutantVector) -> ClassificationResult {
        let severities = self.severities(vector);
        let worst = severities.iter().copied().max().unwrap_or(0);
        let agreeing = severities.iter().filter(|s| **s == worst).count();
        let agreement = agreeing as f64 / severities.len() as f64;
        let confidence = round2(BASE_CONFIDENCE + AGREEMENT_WEIGHT * agreement);

        let category = Category::from_rank(worst).unwrap_or(Category::Hazardous);

        tracing::debug!(
            ?severities,
            category = %category,
            confidence,
            "Breakpoint classification"
        );

        ClassificationResult::new(
            category,
            Some(confidence),
            ClassificationMethod::RuleBased,
            InputSnapshot::Pollutants(*vector),
        )
    }
}

/// Classify with the default tables.
#[must_use]
pub fn classify(vector: &PollutantVector) -> ClassificationResult {
    ThresholdClassifier::default().classify(vector)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
