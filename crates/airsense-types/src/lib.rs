//! Platform-agnostic types for AirSense air-quality classification.
//!
//! This crate provides the shared data model used by the classification core
//! (airsense-core) and any UI shell that displays its results.
//!
//! # Features
//!
//! - Five-level [`Category`] with an explicit rank table
//! - Pollutant vectors and IoT gas-index readings
//! - Classification results and notification decisions
//! - Label parsing for both the canonical and the ISPU vocabulary
//!
//! # Example
//!
//! ```
//! use airsense_types::{Category, Direction, Pollutant, PollutantVector};
//!
//! let reading = PollutantVector::new().with(Pollutant::Pm25, 35.0);
//! assert_eq!(reading.get(Pollutant::Pm25), Some(35.0));
//!
//! let trend = Direction::between(Category::Good, Category::Moderate);
//! assert_eq!(trend, Direction::Worsened);
//! ```

pub mod error;
pub mod reading;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use reading::{
    ClassificationResult, InputSnapshot, IoTReading, NotificationDecision, Pollutant,
    PollutantVector,
};
pub use types::{Category, ClassificationMethod, DataSource, Direction};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // --- Category rank table ---

    #[test]
    fn test_category_rank_round_trip() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.rank() as usize, i);
            assert_eq!(Category::from_rank(i as u8), Some(*category));
        }
        assert_eq!(Category::from_rank(5), None);
        assert_eq!(Category::from_rank(255), None);
    }

    #[test]
    fn test_category_ordering_matches_rank() {
        assert!(Category::Good < Category::Moderate);
        assert!(Category::Moderate < Category::UnhealthyForSensitive);
        assert!(Category::UnhealthyForSensitive < Category::VeryUnhealthy);
        assert!(Category::VeryUnhealthy < Category::Hazardous);
    }

    #[test]
    fn test_category_repr_values() {
        assert_eq!(Category::Good as u8, 0);
        assert_eq!(Category::Hazardous as u8, 4);
    }

    // --- Label parsing ---

    #[test]
    fn test_from_label_canonical() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
    }

    #[test]
    fn test_from_label_ispu() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.ispu_label()), Some(category));
        }
    }

    #[test]
    fn test_from_label_separator_variants() {
        assert_eq!(
            Category::from_label("UNHEALTHY_FOR_SENSITIVE"),
            Some(Category::UnhealthyForSensitive)
        );
        assert_eq!(
            Category::from_label("sangat_tidak_sehat"),
            Some(Category::VeryUnhealthy)
        );
        assert_eq!(
            Category::from_label("Very-Unhealthy"),
            Some(Category::VeryUnhealthy)
        );
        assert_eq!(
            Category::from_label("  tidak   sehat "),
            Some(Category::UnhealthyForSensitive)
        );
        assert_eq!(Category::from_label("baik"), Some(Category::Good));
    }

    #[test]
    fn test_from_label_unknown() {
        assert_eq!(Category::from_label(""), None);
        assert_eq!(Category::from_label("EXCELLENT"), None);
        assert_eq!(Category::from_label("GOOD GOOD"), None);
    }

    #[test]
    fn test_category_from_str_error() {
        let err = "purple".parse::<Category>().unwrap_err();
        assert_eq!(err, ParseError::UnknownCategory("purple".to_string()));
        assert!(err.to_string().contains("purple"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(format!("{}", Category::Good), "Good");
        assert_eq!(
            format!("{}", Category::UnhealthyForSensitive),
            "Unhealthy for Sensitive Groups"
        );
    }

    #[test]
    fn test_advice_escalates_and_is_empty_for_good() {
        assert!(Category::Good.advice().is_empty());
        for category in &Category::ALL[1..] {
            assert!(!category.advice().is_empty());
        }
        assert!(Category::Hazardous.advice().starts_with("WARNING"));
    }

    // --- Direction ---

    #[test]
    fn test_direction_between() {
        assert_eq!(
            Direction::between(Category::Hazardous, Category::Good),
            Direction::Improved
        );
        assert_eq!(
            Direction::between(Category::Moderate, Category::VeryUnhealthy),
            Direction::Worsened
        );
        assert_eq!(
            Direction::between(Category::Moderate, Category::Moderate),
            Direction::Same
        );
        assert!(!Direction::Initial.is_change());
        assert!(Direction::Improved.is_change());
    }

    proptest! {
        #[test]
        fn prop_direction_is_total_and_antisymmetric(a in 0u8..5, b in 0u8..5) {
            let (a, b) = (Category::from_rank(a).unwrap(), Category::from_rank(b).unwrap());
            let forward = Direction::between(a, b);
            let backward = Direction::between(b, a);
            match forward {
                Direction::Improved => prop_assert_eq!(backward, Direction::Worsened),
                Direction::Worsened => prop_assert_eq!(backward, Direction::Improved),
                Direction::Same => {
                    prop_assert_eq!(backward, Direction::Same);
                    prop_assert_eq!(a, b);
                }
                Direction::Initial => prop_assert!(false, "between never yields Initial"),
            }
        }

        #[test]
        fn prop_direction_is_transitive(a in 0u8..5, b in 0u8..5, c in 0u8..5) {
            let (a, b, c) = (
                Category::from_rank(a).unwrap(),
                Category::from_rank(b).unwrap(),
                Category::from_rank(c).unwrap(),
            );
            if Direction::between(a, b) == Direction::Worsened
                && Direction::between(b, c) == Direction::Worsened
            {
                prop_assert_eq!(Direction::between(a, c), Direction::Worsened);
            }
        }
    }

    // --- DataSource ---

    #[test]
    fn test_data_source_parse() {
        assert_eq!("iot".parse::<DataSource>(), Ok(DataSource::Iot));
        assert_eq!("OpenAQ".parse::<DataSource>(), Ok(DataSource::OpenAq));
        assert_eq!(
            "openweathermap".parse::<DataSource>(),
            Ok(DataSource::OpenWeatherMap)
        );
        assert!("satellite".parse::<DataSource>().is_err());
        assert!(DataSource::Iot.is_iot());
        assert!(!DataSource::OpenAq.is_iot());
    }

    // --- PollutantVector ---

    #[test]
    fn test_pollutant_vector_absent_is_not_zero() {
        let v = PollutantVector::new().with(Pollutant::So2, 0.0);
        assert_eq!(v.get(Pollutant::So2), Some(0.0));
        assert_eq!(v.get(Pollutant::No2), None);
        assert!(!v.is_empty());
        assert!(PollutantVector::new().is_empty());
    }

    #[test]
    fn test_pollutant_vector_iter_order() {
        let v = PollutantVector::new();
        let order: Vec<_> = v.iter().map(|(p, _)| p).collect();
        assert_eq!(order, Pollutant::ALL.to_vec());
    }

    #[test]
    fn test_pollutant_units() {
        assert_eq!(Pollutant::Co.unit(), "mg/m³");
        assert_eq!(Pollutant::Pm25.unit(), "µg/m³");
    }

    #[test]
    fn test_pollutant_vector_provider_aliases() {
        let json = r#"{
            "pm_sepuluh": 45,
            "pm_duakomalima": 25,
            "sulfur_dioksida": 30,
            "karbon_monoksida": 2.5,
            "ozon": 40,
            "nitrogen_dioksida": null
        }"#;
        let v: PollutantVector = serde_json::from_str(json).unwrap();
        assert_eq!(v.pm10, Some(45.0));
        assert_eq!(v.pm25, Some(25.0));
        assert_eq!(v.co, Some(2.5));
        assert_eq!(v.no2, None);
        assert_eq!(v.max, None);
    }

    #[test]
    fn test_pollutant_vector_skips_absent_fields() {
        let v = PollutantVector::new().with(Pollutant::O3, 12.0);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"o3":12.0}"#);
    }

    #[test]
    fn test_iot_reading_aliases() {
        let json = r#"{"gas_index": 120, "suhu": 29.5, "kelembapan": 70}"#;
        let r: IoTReading = serde_json::from_str(json).unwrap();
        assert_eq!(r.gas_index, 120.0);
        assert_eq!(r.temperature, Some(29.5));
        assert_eq!(r.humidity, Some(70.0));
        assert_eq!(r.pressure, None);
    }

    // --- ClassificationResult ---

    #[test]
    fn test_method_label() {
        let iot = ClassificationResult::new(
            Category::Good,
            Some(0.95),
            ClassificationMethod::RuleBased,
            InputSnapshot::GasIndex(IoTReading::new(10.0)),
        );
        assert_eq!(iot.method_label(), "Sensor threshold");
        assert!(iot.pollutants().is_none());

        let rule = ClassificationResult::new(
            Category::Good,
            Some(0.95),
            ClassificationMethod::RuleBased,
            InputSnapshot::Pollutants(PollutantVector::new()),
        );
        assert_eq!(rule.method_label(), "Rule-based");

        let model = ClassificationResult {
            method: ClassificationMethod::ModelBased,
            ..rule
        };
        assert_eq!(model.method_label(), "Model");
        assert!(model.pollutants().is_some());
    }

    #[test]
    fn test_result_serializes_method_and_category() {
        let result = ClassificationResult::new(
            Category::UnhealthyForSensitive,
            None,
            ClassificationMethod::ModelBased,
            InputSnapshot::Pollutants(PollutantVector::new()),
        )
        .at(time::OffsetDateTime::UNIX_EPOCH);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["category"], "UNHEALTHY_FOR_SENSITIVE");
        assert_eq!(json["method"], "MODEL_BASED");
        assert_eq!(json["evaluated_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["input"]["kind"], "pollutants");
    }

    // --- NotificationDecision ---

    #[test]
    fn test_notification_decision_constructors() {
        let silent = NotificationDecision::silent(Direction::Initial, Category::Good, None);
        assert!(!silent.should_notify);
        assert!(silent.message.is_none());

        let loud = NotificationDecision::notify(
            Direction::Worsened,
            Category::Moderate,
            Category::Good,
            "msg".to_string(),
        );
        assert!(loud.should_notify);
        assert_eq!(loud.previous, Some(Category::Good));
        assert_eq!(loud.message.as_deref(), Some("msg"));
    }
}
