//! Core enumerations for AirSense classification.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Five-level air-quality category, ordered from best to worst.
///
/// # Ordering
///
/// Categories are ordered by rank: `Good < Moderate < UnhealthyForSensitive
/// < VeryUnhealthy < Hazardous`. All improved/worsened comparisons go through
/// [`Category::rank`], never through label strings.
///
/// # Labels
///
/// [`Category::label`] returns the canonical upper-case label, `Display`
/// returns a human-readable label and [`Category::ispu_label`] returns the
/// Indonesian ISPU label the remote model was trained on.
///
/// ```
/// use airsense_types::Category;
///
/// assert!(Category::Hazardous > Category::Moderate);
/// assert_eq!(Category::UnhealthyForSensitive.label(), "UNHEALTHY FOR SENSITIVE");
/// assert_eq!(format!("{}", Category::VeryUnhealthy), "Very Unhealthy");
/// assert_eq!(Category::from_label("tidak_sehat"), Some(Category::UnhealthyForSensitive));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[repr(u8)]
pub enum Category {
    /// Air quality is satisfactory.
    Good = 0,
    /// Acceptable; sensitive people may be affected.
    Moderate = 1,
    /// Sensitive groups experience health effects.
    UnhealthyForSensitive = 2,
    /// Everyone may experience health effects.
    VeryUnhealthy = 3,
    /// Health emergency.
    Hazardous = 4,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 5;

    /// All categories in rank order (index == rank).
    pub const ALL: [Category; Category::COUNT] = [
        Category::Good,
        Category::Moderate,
        Category::UnhealthyForSensitive,
        Category::VeryUnhealthy,
        Category::Hazardous,
    ];

    /// Ordinal rank, 0 (best) to 4 (worst).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Category::Good => 0,
            Category::Moderate => 1,
            Category::UnhealthyForSensitive => 2,
            Category::VeryUnhealthy => 3,
            Category::Hazardous => 4,
        }
    }

    /// Category for a rank, or `None` if the rank is out of range.
    ///
    /// ```
    /// use airsense_types::Category;
    ///
    /// assert_eq!(Category::from_rank(0), Some(Category::Good));
    /// assert_eq!(Category::from_rank(4), Some(Category::Hazardous));
    /// assert_eq!(Category::from_rank(5), None);
    /// ```
    #[must_use]
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Category::Good),
            1 => Some(Category::Moderate),
            2 => Some(Category::UnhealthyForSensitive),
            3 => Some(Category::VeryUnhealthy),
            4 => Some(Category::Hazardous),
            _ => None,
        }
    }

    /// Canonical upper-case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Category::Good => "GOOD",
            Category::Moderate => "MODERATE",
            Category::UnhealthyForSensitive => "UNHEALTHY FOR SENSITIVE",
            Category::VeryUnhealthy => "VERY UNHEALTHY",
            Category::Hazardous => "HAZARDOUS",
        }
    }

    /// Indonesian ISPU label for this category.
    #[must_use]
    pub const fn ispu_label(self) -> &'static str {
        match self {
            Category::Good => "BAIK",
            Category::Moderate => "SEDANG",
            Category::UnhealthyForSensitive => "TIDAK SEHAT",
            Category::VeryUnhealthy => "SANGAT TIDAK SEHAT",
            Category::Hazardous => "BERBAHAYA",
        }
    }

    /// Parse a category label from either vocabulary.
    ///
    /// Matching is case-insensitive and treats `_`, `-` and runs of
    /// whitespace as a single space, so `"very_unhealthy"`,
    /// `"Very-Unhealthy"` and `"SANGAT  TIDAK SEHAT"` all resolve.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        match normalized.as_str() {
            "GOOD" | "BAIK" => Some(Category::Good),
            "MODERATE" | "SEDANG" => Some(Category::Moderate),
            "UNHEALTHY FOR SENSITIVE"
            | "UNHEALTHY FOR SENSITIVE GROUPS"
            | "UNHEALTHY"
            | "TIDAK SEHAT" => Some(Category::UnhealthyForSensitive),
            "VERY UNHEALTHY" | "SANGAT TIDAK SEHAT" => Some(Category::VeryUnhealthy),
            "HAZARDOUS" | "BERBAHAYA" => Some(Category::Hazardous),
            _ => None,
        }
    }

    /// Short description of the category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Category::Good => "Air quality is good and poses little or no risk",
            Category::Moderate => "Air quality is acceptable for most people",
            Category::UnhealthyForSensitive => "Air quality is starting to affect health",
            Category::VeryUnhealthy => "Air quality is harmful to health",
            Category::Hazardous => "Health emergency affecting the entire population",
        }
    }

    /// Recommendation for people exposed to this category.
    #[must_use]
    pub const fn recommendation(self) -> &'static str {
        match self {
            Category::Good => "Air quality is very good. Suitable for outdoor activities.",
            Category::Moderate => {
                "Air quality is acceptable. Sensitive groups should limit outdoor activity."
            }
            Category::UnhealthyForSensitive => {
                "Air quality is affecting health. Reduce outdoor activity and wear a mask if needed."
            }
            Category::VeryUnhealthy => {
                "Avoid outdoor activity, close windows and use an air purifier."
            }
            Category::Hazardous => {
                "Emergency conditions. Stay indoors and wear an N95 mask if you must go out."
            }
        }
    }

    /// Advice appended to a worsening alert, escalating with severity.
    ///
    /// Empty for [`Category::Good`].
    #[must_use]
    pub const fn advice(self) -> &'static str {
        match self {
            Category::Good => "",
            Category::Moderate => "Sensitive groups should limit outdoor activity.",
            Category::UnhealthyForSensitive => "Reducing time spent outdoors is recommended.",
            Category::VeryUnhealthy => "Avoid outdoor activity.",
            Category::Hazardous => "WARNING: Stay indoors and avoid exposure to outside air!",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Good => write!(f, "Good"),
            Category::Moderate => write!(f, "Moderate"),
            Category::UnhealthyForSensitive => write!(f, "Unhealthy for Sensitive Groups"),
            Category::VeryUnhealthy => write!(f, "Very Unhealthy"),
            Category::Hazardous => write!(f, "Hazardous"),
        }
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| ParseError::UnknownCategory(s.to_string()))
    }
}

/// Direction of a category change between two consecutive classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Direction {
    /// Rank decreased.
    Improved,
    /// Rank increased.
    Worsened,
    /// Rank unchanged.
    Same,
    /// No previous category to compare with.
    Initial,
}

impl Direction {
    /// Compare two categories by rank.
    ///
    /// Exactly one of `Improved`, `Worsened` or `Same` is returned for any pair.
    ///
    /// ```
    /// use airsense_types::{Category, Direction};
    ///
    /// assert_eq!(Direction::between(Category::Moderate, Category::Good), Direction::Improved);
    /// assert_eq!(Direction::between(Category::Good, Category::Hazardous), Direction::Worsened);
    /// assert_eq!(Direction::between(Category::Good, Category::Good), Direction::Same);
    /// ```
    #[must_use]
    pub fn between(previous: Category, current: Category) -> Self {
        match current.rank().cmp(&previous.rank()) {
            core::cmp::Ordering::Less => Direction::Improved,
            core::cmp::Ordering::Greater => Direction::Worsened,
            core::cmp::Ordering::Equal => Direction::Same,
        }
    }

    /// Whether the direction represents an actual change.
    #[must_use]
    pub fn is_change(self) -> bool {
        matches!(self, Direction::Improved | Direction::Worsened)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Improved => write!(f, "improved"),
            Direction::Worsened => write!(f, "worsened"),
            Direction::Same => write!(f, "same"),
            Direction::Initial => write!(f, "initial"),
        }
    }
}

/// Provider a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataSource {
    /// Local IoT sensor node (MQ-135 gas sensor plus DHT22/BMP280).
    Iot,
    /// OpenWeatherMap air pollution API.
    OpenWeatherMap,
    /// OpenAQ measurement network.
    OpenAq,
}

impl DataSource {
    /// Whether readings from this source are classified by gas index.
    #[must_use]
    pub fn is_iot(self) -> bool {
        matches!(self, DataSource::Iot)
    }

    /// Stable lower-case tag used in persistence and alert payloads.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            DataSource::Iot => "iot",
            DataSource::OpenWeatherMap => "openweathermap",
            DataSource::OpenAq => "openaq",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Iot => write!(f, "IoT Sensor"),
            DataSource::OpenWeatherMap => write!(f, "OpenWeatherMap"),
            DataSource::OpenAq => write!(f, "OpenAQ"),
        }
    }
}

impl FromStr for DataSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "iot" => Ok(DataSource::Iot),
            "openweathermap" | "owm" => Ok(DataSource::OpenWeatherMap),
            "openaq" => Ok(DataSource::OpenAq),
            _ => Err(ParseError::UnknownDataSource(s.to_string())),
        }
    }
}

/// How a classification was produced, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ClassificationMethod {
    /// Local threshold rules.
    RuleBased,
    /// Remote model, including its transparent local fallback.
    ModelBased,
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationMethod::RuleBased => write!(f, "Rule-based"),
            ClassificationMethod::ModelBased => write!(f, "Model"),
        }
    }
}
