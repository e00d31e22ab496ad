//! Error types for airsense-core.
//!
//! Only two kinds of failure reach a caller of the classification flow:
//! configuration problems and missing or invalid input. Everything else is
//! recovered locally.
//!
//! | Failure | Handling |
//! |---------|----------|
//! | Inference transport, timeout, bad status | Fallback to the breakpoint classifier, logged at `warn` |
//! | Inference `useFallback` / `error` field | Fallback to the breakpoint classifier, logged at `warn` |
//! | Unrecognised model label | Defaults to `Moderate`, logged at `warn` |
//! | Reading or alert sink failure | Logged at `warn`, broadcast as [`crate::MonitorEvent::SinkFailed`] |
//! | [`Error::Config`] | Returned immediately |
//! | [`Error::MissingInput`], [`Error::InvalidReading`] | Returned immediately |
//! | [`Error::Busy`] | Returned immediately; the caller retries later |

use airsense_types::DataSource;
use thiserror::Error;

use crate::config::ConfigError;
use crate::validation::ValidationWarning;

/// Errors surfaced by the classification core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A required input is missing from the reading.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// The reading failed validation.
    #[error("Invalid reading: {}", format_warnings(.0))]
    InvalidReading(Vec<ValidationWarning>),

    /// A classification is already in flight for this stream.
    #[error("A classification for {stream} is already in progress")]
    Busy {
        /// Source of the stream that is busy.
        stream: DataSource,
    },

    /// An endpoint URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

fn format_warnings(warnings: &[ValidationWarning]) -> String {
    warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using airsense-core's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
