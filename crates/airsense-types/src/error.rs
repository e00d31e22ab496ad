//! Error types for label and data parsing in airsense-types.

use thiserror::Error;

/// Errors that can occur when parsing AirSense data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A category label matched neither the canonical nor the ISPU vocabulary.
    #[error("Unknown air quality category: '{0}'")]
    UnknownCategory(String),

    /// A data source tag was not recognised.
    #[error("Unknown data source: '{0}'")]
    UnknownDataSource(String),

    /// Generic invalid data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using airsense-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
