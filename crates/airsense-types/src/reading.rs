//! Reading and result types shared by the classifiers and the UI shell.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use time::OffsetDateTime;

use crate::types::{Category, ClassificationMethod, Direction};

/// One of the six pollutants reported by the air-quality providers.
///
/// Variants are declared in feature order: the order of
/// [`Pollutant::ALL`] is the order used for the remote model's feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Pollutant {
    /// Particulate matter up to 10 µm.
    Pm10,
    /// Particulate matter up to 2.5 µm.
    Pm25,
    /// Sulfur dioxide.
    So2,
    /// Carbon monoxide.
    Co,
    /// Ozone.
    O3,
    /// Nitrogen dioxide.
    No2,
}

impl Pollutant {
    /// All pollutants in feature order.
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm10,
        Pollutant::Pm25,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::O3,
        Pollutant::No2,
    ];

    /// Display name with subscripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "PM10",
            Pollutant::Pm25 => "PM2.5",
            Pollutant::So2 => "SO₂",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O₃",
            Pollutant::No2 => "NO₂",
        }
    }

    /// Concentration unit. CO is reported in mg/m³, everything else in µg/m³.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Pollutant::Co => "mg/m³",
            _ => "µg/m³",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pollutant concentrations for one reading.
///
/// Every field is optional: a provider that did not report a pollutant leaves
/// it `None`. Absence is not zero; the classifiers treat an absent value as
/// the best severity for that pollutant.
///
/// The provider field names (`pm_sepuluh`, `pm_duakomalima`, ...) are
/// accepted as aliases when deserializing.
///
/// ```
/// use airsense_types::{Pollutant, PollutantVector};
///
/// let v = PollutantVector::new()
///     .with(Pollutant::Pm25, 42.0)
///     .with(Pollutant::Co, 2.5);
/// assert_eq!(v.get(Pollutant::Pm25), Some(42.0));
/// assert_eq!(v.get(Pollutant::So2), None);
/// assert_eq!(v.present().count(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PollutantVector {
    /// PM10 in µg/m³.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "pm_sepuluh", skip_serializing_if = "Option::is_none")
    )]
    pub pm10: Option<f64>,
    /// PM2.5 in µg/m³.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "pm_duakomalima", skip_serializing_if = "Option::is_none")
    )]
    pub pm25: Option<f64>,
    /// SO₂ in µg/m³.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "sulfur_dioksida", skip_serializing_if = "Option::is_none")
    )]
    pub so2: Option<f64>,
    /// CO in mg/m³.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "karbon_monoksida", skip_serializing_if = "Option::is_none")
    )]
    pub co: Option<f64>,
    /// O₃ in µg/m³.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "ozon", skip_serializing_if = "Option::is_none")
    )]
    pub o3: Option<f64>,
    /// NO₂ in µg/m³.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "nitrogen_dioksida", skip_serializing_if = "Option::is_none")
    )]
    pub no2: Option<f64>,
    /// Precomputed composite severity (0-4), if the provider supplied one.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "MAX", skip_serializing_if = "Option::is_none")
    )]
    pub max: Option<f64>,
}

impl PollutantVector {
    /// Create an empty vector (all pollutants absent).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for a pollutant.
    #[must_use]
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm10 => self.pm10,
            Pollutant::Pm25 => self.pm25,
            Pollutant::So2 => self.so2,
            Pollutant::Co => self.co,
            Pollutant::O3 => self.o3,
            Pollutant::No2 => self.no2,
        }
    }

    /// Set or clear the value for a pollutant.
    pub fn set(&mut self, pollutant: Pollutant, value: Option<f64>) {
        let slot = match pollutant {
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::Pm25 => &mut self.pm25,
            Pollutant::So2 => &mut self.so2,
            Pollutant::Co => &mut self.co,
            Pollutant::O3 => &mut self.o3,
            Pollutant::No2 => &mut self.no2,
        };
        *slot = value;
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.set(pollutant, Some(value));
        self
    }

    /// Builder-style setter for the composite severity.
    #[must_use]
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// All six pollutants in feature order with their optional values.
    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, Option<f64>)> + '_ {
        Pollutant::ALL.into_iter().map(|p| (p, self.get(p)))
    }

    /// Only the pollutants that have a value.
    pub fn present(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        self.iter().filter_map(|(p, v)| v.map(|v| (p, v)))
    }

    /// Whether no pollutant has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

/// Reading from the local IoT sensor node.
///
/// Only `gas_index` takes part in classification; the environmental values
/// are carried for display.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IoTReading {
    /// Unitless MQ-135 derived gas index (non-negative).
    pub gas_index: f64,
    /// Raw MQ-135 ADC value (0-4095).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub mq135_raw: Option<u16>,
    /// Temperature in °C.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "suhu", skip_serializing_if = "Option::is_none")
    )]
    pub temperature: Option<f64>,
    /// Relative humidity in %.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "kelembapan", skip_serializing_if = "Option::is_none")
    )]
    pub humidity: Option<f64>,
    /// Pressure in hPa.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "tekanan", skip_serializing_if = "Option::is_none")
    )]
    pub pressure: Option<f64>,
}

impl IoTReading {
    /// Create a reading with only a gas index.
    #[must_use]
    pub fn new(gas_index: f64) -> Self {
        Self {
            gas_index,
            mq135_raw: None,
            temperature: None,
            humidity: None,
            pressure: None,
        }
    }
}

/// The input a classification was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum InputSnapshot {
    /// A pollutant vector (rule-based or model path).
    Pollutants(PollutantVector),
    /// An IoT gas index reading (sensor-threshold path).
    GasIndex(IoTReading),
}

/// Result of one classification call.
///
/// Created fresh by every classifier call and handed out by value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassificationResult {
    /// The category.
    pub category: Category,
    /// Confidence in `[0, 1]`, if known.
    pub confidence: Option<f64>,
    /// How the result was produced.
    pub method: ClassificationMethod,
    /// When the classification ran.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub evaluated_at: OffsetDateTime,
    /// Input the classifier saw.
    pub input: InputSnapshot,
}

impl ClassificationResult {
    /// Create a result stamped with the current time.
    #[must_use]
    pub fn new(
        category: Category,
        confidence: Option<f64>,
        method: ClassificationMethod,
        input: InputSnapshot,
    ) -> Self {
        Self {
            category,
            confidence,
            method,
            evaluated_at: OffsetDateTime::now_utc(),
            input,
        }
    }

    /// Override the evaluation timestamp.
    #[must_use]
    pub fn at(mut self, evaluated_at: OffsetDateTime) -> Self {
        self.evaluated_at = evaluated_at;
        self
    }

    /// Label for the UI badge.
    ///
    /// Rule-based results computed from a gas index read "Sensor threshold"
    /// so the UI can tell them apart from breakpoint classifications.
    #[must_use]
    pub fn method_label(&self) -> &'static str {
        match (self.method, &self.input) {
            (ClassificationMethod::RuleBased, InputSnapshot::GasIndex(_)) => "Sensor threshold",
            (ClassificationMethod::RuleBased, InputSnapshot::Pollutants(_)) => "Rule-based",
            (ClassificationMethod::ModelBased, _) => "Model",
        }
    }

    /// Pollutant snapshot, if the result was computed from one.
    #[must_use]
    pub fn pollutants(&self) -> Option<&PollutantVector> {
        match &self.input {
            InputSnapshot::Pollutants(v) => Some(v),
            InputSnapshot::GasIndex(_) => None,
        }
    }
}

/// Whether a classification should raise a user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NotificationDecision {
    /// Whether a toast/alert should be emitted.
    pub should_notify: bool,
    /// Direction relative to the last category seen on the stream.
    pub direction: Direction,
    /// Category that was observed.
    pub category: Category,
    /// Category it was compared with, if any.
    pub previous: Option<Category>,
    /// Formatted message, present only when `should_notify` is set.
    pub message: Option<String>,
}

impl NotificationDecision {
    /// A decision that emits nothing.
    #[must_use]
    pub fn silent(direction: Direction, category: Category, previous: Option<Category>) -> Self {
        Self {
            should_notify: false,
            direction,
            category,
            previous,
            message: None,
        }
    }

    /// A decision that emits `message`.
    #[must_use]
    pub fn notify(
        direction: Direction,
        category: Category,
        previous: Category,
        message: String,
    ) -> Self {
        Self {
            should_notify: true,
            direction,
            category,
            previous: Some(previous),
            message: Some(message),
        }
    }
}
