//! Air quality classification core for AirSense.
//!
//! This crate turns raw readings into a five-level air quality
//! [`Category`] and decides when a change in that category deserves a
//! notification.
//!
//! # Features
//!
//! - **Breakpoint rules**: worst-pollutant classification over six tables
//! - **IoT sensor rules**: gas-index cutoffs for the local sensor node
//! - **Remote model**: HTTP inference with a transparent local fallback
//! - **Transition tracking**: direction detection with a hysteresis window
//! - **Alerts**: short in-app messages and rich push text
//! - **Sinks**: reading persistence and Telegram push, fire-and-forget
//! - **Per-stream monitor**: one entry point tying everything together
//!
//! # Classification paths
//!
//! | Source | Classifier | Method |
//! |--------|------------|--------|
//! | IoT sensor | [`IotClassifier`] | Rule-based |
//! | OpenWeatherMap / OpenAQ | [`RemoteClassifier`] when configured | Model |
//! | OpenWeatherMap / OpenAQ | [`ThresholdClassifier`] otherwise | Rule-based |
//!
//! # Quick Start
//!
//! ```
//! use airsense_core::{AirQualityMonitor, Reading};
//! use airsense_types::{Category, IoTReading};
//!
//! # #[tokio::main]
//! # async fn main() -> airsense_core::Result<()> {
//! let monitor = AirQualityMonitor::new();
//! let mut events = monitor.subscribe();
//!
//! let outcome = monitor.process(Reading::from_iot(IoTReading::new(230.0))).await?;
//! assert_eq!(outcome.result.category, Category::UnhealthyForSensitive);
//! assert!(events.try_recv().is_ok());
//! # Ok(())
//! # }
//! ```

pub mod breakpoints;
pub mod config;
pub mod error;
pub mod events;
pub mod inference;
pub mod iot;
pub mod message;
pub mod mock;
pub mod monitor;
pub mod remote;
pub mod sinks;
pub mod tracker;
pub mod validation;

pub use breakpoints::{BreakpointConfig, Breakpoints, MAX_SEVERITY, ThresholdClassifier, classify};
pub use config::{Config, ConfigError, ValidationError, default_config_path};
pub use error::{Error, Result};
pub use events::{EventDispatcher, EventReceiver, EventSender, MonitorEvent, SinkKind};
pub use inference::{
    HttpInferenceClient, InferenceClient, InferenceError, InferenceOutcome, InferenceRequest,
    Prediction,
};
pub use iot::{IotClassifier, IotThresholds, classify_iot};
pub use message::{AlertPayload, format_alert, render_push_alert};
pub use mock::{MockInferenceClient, RecordingSink, SinkDelivery};
pub use monitor::{AirQualityMonitor, ClassificationOutcome, Reading};
pub use remote::{RemoteClassifier, normalize_label};
pub use sinks::{
    AlertSink, HttpReadingSink, ReadingRecord, ReadingSink, SinkError, TelegramAlertSink,
};
pub use tracker::{AlertContext, TransitionState, TransitionTracker};
pub use validation::{ReadingValidator, ValidationResult, ValidationWarning, ValidatorConfig};

// Re-export from airsense-types
pub use airsense_types::{
    Category, ClassificationMethod, ClassificationResult, DataSource, Direction, InputSnapshot,
    IoTReading, NotificationDecision, Pollutant, PollutantVector,
};
