//! Per-stream classification monitor.
//!
//! An [`AirQualityMonitor`] drives one reading stream: it validates each
//! [`Reading`], picks the classifier for its source, feeds the result to the
//! stream's [`TransitionTracker`] and hands the outcome to the event channel
//! and the sinks.
//!
//! The tracker update is a critical section behind a `tokio` mutex, and at
//! most one classification may be in flight at a time. A second call made
//! while one is outstanding fails with [`Error::Busy`] instead of queueing.
//!
//! # Example
//!
//! ```
//! use airsense_core::{AirQualityMonitor, Reading};
//! use airsense_types::{Category, DataSource, Direction, Pollutant, PollutantVector};
//!
//! # #[tokio::main]
//! # async fn main() -> airsense_core::Result<()> {
//! let monitor = AirQualityMonitor::new();
//!
//! let clean = PollutantVector::new().with(Pollutant::Pm10, 30.0);
//! let outcome = monitor
//!     .process(Reading::from_pollutants(DataSource::OpenAq, clean))
//!     .await?;
//! assert_eq!(outcome.result.category, Category::Good);
//! assert_eq!(outcome.decision.direction, Direction::Initial);
//!
//! let smoky = PollutantVector::new().with(Pollutant::Pm25, 200.0);
//! let outcome = monitor
//!     .process(Reading::from_pollutants(DataSource::OpenAq, smoky))
//!     .await?;
//! assert_eq!(outcome.result.category, Category::VeryUnhealthy);
//! assert!(outcome.decision.should_notify);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use airsense_types::{
    ClassificationResult, DataSource, IoTReading, NotificationDecision, PollutantVector,
};

use crate::breakpoints::{BreakpointConfig, ThresholdClassifier};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{EventDispatcher, EventReceiver, MonitorEvent, SinkKind};
use crate::inference::HttpInferenceClient;
use crate::iot::{IotClassifier, IotThresholds};
use crate::message::AlertPayload;
use crate::remote::RemoteClassifier;
use crate::sinks::{AlertSink, HttpReadingSink, ReadingRecord, ReadingSink, TelegramAlertSink};
use crate::tracker::{AlertContext, TransitionTracker};
use crate::validation::ReadingValidator;

/// A normalised reading from any provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Provider the reading came from.
    pub source: DataSource,
    /// Human readable location, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Pollutant concentrations (provider sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollutants: Option<PollutantVector>,
    /// Sensor values (IoT source).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iot: Option<IoTReading>,
    /// When the reading was taken. Defaults to the time it was parsed.
    #[serde(default = "OffsetDateTime::now_utc", with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
}

impl Reading {
    /// A provider reading carrying a pollutant vector.
    #[must_use]
    pub fn from_pollutants(source: DataSource, pollutants: PollutantVector) -> Self {
        Self {
            source,
            location: None,
            pollutants: Some(pollutants),
            iot: None,
            captured_at: OffsetDateTime::now_utc(),
        }
    }

    /// An IoT sensor reading.
    #[must_use]
    pub fn from_iot(iot: IoTReading) -> Self {
        Self {
            source: DataSource::Iot,
            location: None,
            pollutants: None,
            iot: Some(iot),
            captured_at: OffsetDateTime::now_utc(),
        }
    }

    /// Attach a location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Override the capture time.
    #[must_use]
    pub fn captured_at(mut self, at: OffsetDateTime) -> Self {
        self.captured_at = at;
        self
    }
}

/// What the monitor decided for one reading.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    /// The classification.
    pub result: ClassificationResult,
    /// The notification decision for the stream.
    pub decision: NotificationDecision,
}

#[derive(Debug, Default)]
struct StreamState {
    source: Option<DataSource>,
    tracker: TransitionTracker,
    last_result: Option<ClassificationResult>,
}

/// Clears the in-flight flag when a classification ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Classification driver for one reading stream.
pub struct AirQualityMonitor {
    state: Mutex<StreamState>,
    in_flight: AtomicBool,
    threshold: ThresholdClassifier,
    iot: IotClassifier,
    remote: Option<RemoteClassifier>,
    validator: ReadingValidator,
    reading_sink: Option<Arc<dyn ReadingSink>>,
    alert_sink: Option<Arc<dyn AlertSink>>,
    events: EventDispatcher,
}

impl std::fmt::Debug for AirQualityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirQualityMonitor")
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .field("remote", &self.remote.is_some())
            .field("reading_sink", &self.reading_sink.is_some())
            .field("alert_sink", &self.alert_sink.is_some())
            .finish()
    }
}

impl Default for AirQualityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl AirQualityMonitor {
    /// Create a monitor with default thresholds, local rules only and no sinks.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StreamState::default()),
            in_flight: AtomicBool::new(false),
            threshold: ThresholdClassifier::default(),
            iot: IotClassifier::default(),
            remote: None,
            validator: ReadingValidator::default(),
            reading_sink: None,
            alert_sink: None,
            events: EventDispatcher::default(),
        }
    }

    /// Build a monitor from configuration.
    ///
    /// The configuration is validated first. An inference endpoint enables
    /// the model path, a history endpoint enables persistence and Telegram
    /// credentials (from the file or the environment) enable push alerts.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut monitor = Self::new()
            .thresholds(config.breakpoints.clone())
            .iot(config.iot.clone())
            .suppression_window(config.notifications.suppression_window())
            .notifications(config.notifications.enabled)
            .events(EventDispatcher::new(config.events.buffer));

        if let Some(endpoint) = &config.inference.endpoint {
            let timeout = config.inference.timeout();
            let client = HttpInferenceClient::new(endpoint, timeout)?;
            let fallback = ThresholdClassifier::new(config.breakpoints.clone());
            monitor = monitor.remote(
                RemoteClassifier::new(Arc::new(client), fallback)
                    .timeout(timeout)
                    .default_confidence(config.inference.default_confidence),
            );
        }

        if let Some(endpoint) = &config.history.endpoint {
            let sink = HttpReadingSink::new(endpoint, config.history.api_key.clone())?;
            monitor = monitor.reading_sink(Arc::new(sink));
        }

        if let Some(credentials) = config.telegram.credentials() {
            let sink = TelegramAlertSink::with_api_base(
                &config.telegram.api_base,
                credentials.bot_token,
                credentials.chat_id,
            )?;
            monitor = monitor.alert_sink(Arc::new(sink));
        }

        Ok(monitor)
    }

    /// Use custom breakpoint tables for the local rules.
    #[must_use]
    pub fn thresholds(mut self, config: BreakpointConfig) -> Self {
        self.threshold = ThresholdClassifier::new(config);
        self
    }

    /// Use custom IoT cutoffs.
    #[must_use]
    pub fn iot(mut self, thresholds: IotThresholds) -> Self {
        self.iot = IotClassifier::new(thresholds);
        self
    }

    /// Route provider readings through a remote model.
    #[must_use]
    pub fn remote(mut self, remote: RemoteClassifier) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Use a custom validator.
    #[must_use]
    pub fn validator(mut self, validator: ReadingValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Set the hysteresis window. Clears any tracked history.
    #[must_use]
    pub fn suppression_window(mut self, window: time::Duration) -> Self {
        let state = self.state.get_mut();
        state.tracker.reset();
        state.tracker = std::mem::take(&mut state.tracker).with_window(window);
        self
    }

    /// Enable or disable notifications. Tracking continues either way.
    #[must_use]
    pub fn notifications(mut self, enabled: bool) -> Self {
        let state = self.state.get_mut();
        state.tracker = std::mem::take(&mut state.tracker).with_notifications(enabled);
        self
    }

    /// Persist every classified reading.
    #[must_use]
    pub fn reading_sink(mut self, sink: Arc<dyn ReadingSink>) -> Self {
        self.reading_sink = Some(sink);
        self
    }

    /// Push every notification.
    #[must_use]
    pub fn alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }

    /// Use a custom event dispatcher.
    #[must_use]
    pub fn events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Subscribe to monitor events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Whether a classification is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Source of the readings currently tracked.
    pub async fn source(&self) -> Option<DataSource> {
        self.state.lock().await.source
    }

    /// The most recent classification.
    pub async fn last_result(&self) -> Option<ClassificationResult> {
        self.state.lock().await.last_result.clone()
    }

    /// Forget the stream's history.
    pub async fn reset(&self) {
        {
            let mut state = self.state.lock().await;
            state.tracker.reset();
            state.source = None;
            state.last_result = None;
        }
        info!("Stream reset");
        self.events.send(MonitorEvent::Reset);
    }

    /// Classify one reading and update the stream.
    ///
    /// # Errors
    ///
    /// - [`Error::Busy`] if another classification is in flight.
    /// - [`Error::InvalidReading`] if validation found a fatal problem.
    /// - [`Error::MissingInput`] if the reading lacks the data its source needs.
    pub async fn process(&self, reading: Reading) -> Result<ClassificationOutcome> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(Error::Busy {
            stream: reading.source,
        })?;

        let validation = self.validator.validate(&reading);
        if !validation.is_valid {
            return Err(Error::InvalidReading(validation.warnings));
        }
        for warning in &validation.warnings {
            warn!(source = %reading.source, %warning, "Suspicious reading");
        }

        let result = self.classify(&reading).await?;

        let (decision, switched_from) = {
            let mut state = self.state.lock().await;
            let switched_from = match state.source {
                Some(previous) if previous != reading.source => {
                    state.tracker.reset();
                    Some(previous)
                }
                _ => None,
            };
            state.source = Some(reading.source);

            let context = AlertContext {
                location: reading.location.as_deref(),
                pollutants: reading.pollutants.as_ref(),
            };
            let decision = state
                .tracker
                .observe(result.category, reading.captured_at, context);
            state.last_result = Some(result.clone());
            (decision, switched_from)
        };

        if let Some(from) = switched_from {
            info!(%from, to = %reading.source, "Data source changed, tracker reset");
            self.events.send(MonitorEvent::SourceChanged {
                from,
                to: reading.source,
            });
        }

        debug!(
            source = %reading.source,
            category = %result.category,
            method = %result.method,
            direction = %decision.direction,
            "Reading classified"
        );
        self.events.send(MonitorEvent::Classified {
            source: reading.source,
            result: result.clone(),
            decision: decision.clone(),
        });

        if let Some(alert) = alert_payload(&reading, &decision) {
            self.events.send(MonitorEvent::Notification {
                alert: alert.clone(),
            });
            self.spawn_alert(alert);
        }
        self.spawn_record(ReadingRecord::new(&reading, &result));

        Ok(ClassificationOutcome { result, decision })
    }

    async fn classify(&self, reading: &Reading) -> Result<ClassificationResult> {
        if reading.source.is_iot() {
            let iot = reading
                .iot
                .as_ref()
                .ok_or_else(|| Error::MissingInput("IoT reading has no gas index".to_string()))?;
            return Ok(self.iot.classify(iot));
        }

        let vector = reading.pollutants.as_ref().ok_or_else(|| {
            Error::MissingInput(format!("{} reading has no pollutant data", reading.source))
        })?;
        Ok(match &self.remote {
            Some(remote) => remote.classify(vector).await,
            None => self.threshold.classify(vector),
        })
    }

    fn spawn_record(&self, record: ReadingRecord) {
        let Some(sink) = self.reading_sink.clone() else {
            return;
        };
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.record(&record).await {
                warn!(error = %e, "Failed to persist reading");
                events.send(MonitorEvent::SinkFailed {
                    sink: SinkKind::Reading,
                    error: e.to_string(),
                });
            }
        });
    }

    fn spawn_alert(&self, alert: AlertPayload) {
        let Some(sink) = self.alert_sink.clone() else {
            return;
        };
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.send_alert(&alert).await {
                warn!(error = %e, id = %alert.id, "Failed to deliver alert");
                events.send(MonitorEvent::SinkFailed {
                    sink: SinkKind::Alert,
                    error: e.to_string(),
                });
            }
        });
    }
}

fn alert_payload(reading: &Reading, decision: &NotificationDecision) -> Option<AlertPayload> {
    if !decision.should_notify {
        return None;
    }
    let message = decision.message.clone()?;
    Some(AlertPayload {
        id: Uuid::new_v4(),
        category: decision.category,
        previous: decision.previous,
        direction: decision.direction,
        message,
        location: reading.location.clone(),
        source: reading.source,
        pollutants: reading.pollutants,
        raised_at: reading.captured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsense_types::{Category, Direction, Pollutant};
    use time::macros::datetime;

    fn pm25(value: f64) -> PollutantVector {
        PollutantVector::new().with(Pollutant::Pm25, value)
    }

    #[test]
    fn test_reading_json_uses_provider_names() {
        let json = r#"{
            "source": "openaq",
            "location": "Bandung",
            "pollutants": {"pm_sepuluh": 45.0, "karbon_monoksida": 2.5},
            "captured_at": "2026-03-01T08:00:00Z"
        }"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.source, DataSource::OpenAq);
        assert_eq!(reading.location.as_deref(), Some("Bandung"));
        let pollutants = reading.pollutants.unwrap();
        assert_eq!(pollutants.pm10, Some(45.0));
        assert_eq!(pollutants.co, Some(2.5));
        assert_eq!(reading.captured_at, datetime!(2026-03-01 08:00 UTC));
    }

    #[test]
    fn test_reading_without_timestamp_gets_one() {
        let before = OffsetDateTime::now_utc();
        let reading: Reading =
            serde_json::from_str(r#"{"source": "iot", "iot": {"gas_index": 120.0}}"#).unwrap();
        assert!(reading.captured_at >= before);
        assert_eq!(reading.iot.map(|r| r.gas_index), Some(120.0));
    }

    #[test]
    fn test_in_flight_guard_releases() {
        let flag = AtomicBool::new(false);
        {
            let _guard = InFlight::acquire(&flag).unwrap();
            assert!(InFlight::acquire(&flag).is_none());
        }
        assert!(InFlight::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn test_builder_order_keeps_notifications_disabled() {
        let monitors = [
            AirQualityMonitor::new()
                .notifications(false)
                .suppression_window(time::Duration::minutes(5)),
            AirQualityMonitor::new()
                .suppression_window(time::Duration::minutes(5))
                .notifications(false),
        ];

        for monitor in monitors {
            let good = Reading::from_pollutants(DataSource::OpenAq, pm25(10.0))
                .captured_at(datetime!(2026-02-14 06:00 UTC));
            let worse = Reading::from_pollutants(DataSource::OpenAq, pm25(160.0))
                .captured_at(datetime!(2026-02-14 06:30 UTC));

            monitor.process(good).await.unwrap();
            let outcome = monitor.process(worse).await.unwrap();
            assert_eq!(outcome.decision.direction, Direction::Worsened);
            assert!(!outcome.decision.should_notify);
            assert!(outcome.decision.message.is_none());
        }
    }

    #[tokio::test]
    async fn test_iot_reading_uses_gas_index() {
        let monitor = AirQualityMonitor::new();
        let outcome = monitor
            .process(Reading::from_iot(IoTReading::new(150.0)))
            .await
            .unwrap();
        assert_eq!(outcome.result.category, Category::Moderate);
        assert_eq!(outcome.result.confidence, Some(0.90));
        assert_eq!(monitor.source().await, Some(DataSource::Iot));
    }

    #[tokio::test]
    async fn test_iot_source_without_gas_index_is_missing_input() {
        let monitor = AirQualityMonitor::new();
        let reading = Reading {
            iot: None,
            ..Reading::from_iot(IoTReading::new(0.0))
        };
        let err = monitor.process(reading).await.unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
        assert!(!monitor.is_busy());
    }

    #[tokio::test]
    async fn test_provider_source_without_pollutants_is_missing_input() {
        let monitor = AirQualityMonitor::new();
        let reading = Reading {
            pollutants: None,
            ..Reading::from_pollutants(DataSource::OpenWeatherMap, PollutantVector::new())
        };
        assert!(matches!(
            monitor.process(reading).await,
            Err(Error::MissingInput(_))
        ));
    }

    #[tokio::test]
    async fn test_negative_value_is_rejected() {
        let monitor = AirQualityMonitor::new();
        let err = monitor
            .process(Reading::from_pollutants(DataSource::OpenAq, pm25(-1.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidReading(_)));
        assert!(monitor.last_result().await.is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_stream() {
        let monitor = AirQualityMonitor::new();
        monitor
            .process(Reading::from_pollutants(DataSource::OpenAq, pm25(10.0)))
            .await
            .unwrap();
        assert!(monitor.last_result().await.is_some());

        monitor.reset().await;
        assert!(monitor.last_result().await.is_none());
        assert_eq!(monitor.source().await, None);

        let outcome = monitor
            .process(Reading::from_pollutants(DataSource::OpenAq, pm25(200.0)))
            .await
            .unwrap();
        assert_eq!(outcome.decision.direction, Direction::Initial);
    }

    #[tokio::test]
    async fn test_disabled_notifications_still_track() {
        let monitor = AirQualityMonitor::new().notifications(false);
        let t0 = datetime!(2026-01-01 00:00 UTC);
        monitor
            .process(Reading::from_pollutants(DataSource::OpenAq, pm25(10.0)).captured_at(t0))
            .await
            .unwrap();
        let outcome = monitor
            .process(
                Reading::from_pollutants(DataSource::OpenAq, pm25(200.0))
                    .captured_at(t0 + time::Duration::minutes(30)),
            )
            .await
            .unwrap();
        assert!(!outcome.decision.should_notify);
        assert_eq!(outcome.decision.direction, Direction::Worsened);
        assert_eq!(outcome.decision.previous, Some(Category::Good));
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = Config::default();
        config.events.buffer = 0;
        assert!(matches!(
            AirQualityMonitor::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_config_wires_components() {
        let mut config = Config::default();
        config.inference.endpoint = Some("http://localhost:5000/predict".to_string());
        config.history.endpoint = Some("http://localhost:54321/rest/v1/readings".to_string());
        config.telegram.bot_token = Some("123:abc".to_string());
        config.telegram.chat_id = Some("42".to_string());

        let monitor = AirQualityMonitor::from_config(&config).unwrap();
        assert!(monitor.remote.is_some());
        assert!(monitor.reading_sink.is_some());
        assert!(monitor.alert_sink.is_some());
    }
}
