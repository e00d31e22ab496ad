//! Fire-and-forget outputs: reading persistence and push alerts.
//!
//! The monitor spawns sink calls after a result is already decided, so a
//! slow or failing sink never delays or fails classification.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use airsense_types::{Category, ClassificationMethod, ClassificationResult, DataSource};

use crate::error::Result;
use crate::inference::validate_url;
use crate::message::{AlertPayload, render_push_alert};
use crate::monitor::Reading;

/// Default timeout for sink HTTP calls.
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Errors raised by sinks.
///
/// These are logged and broadcast by the monitor, never returned from it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The sink endpoint could not be reached.
    #[error("Sink not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("Sink returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The endpoint accepted the request but refused the content.
    #[error("Sink rejected delivery: {0}")]
    Rejected(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// One persisted row per classified reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    /// Provider the reading came from.
    pub data_source: DataSource,
    /// Location of the reading, if known.
    pub location: Option<String>,
    /// PM10 in µg/m³.
    pub pm10: Option<f64>,
    /// PM2.5 in µg/m³.
    pub pm25: Option<f64>,
    /// SO₂ in µg/m³.
    pub so2: Option<f64>,
    /// CO in mg/m³.
    pub co: Option<f64>,
    /// O₃ in µg/m³.
    pub o3: Option<f64>,
    /// NO₂ in µg/m³.
    pub no2: Option<f64>,
    /// Classified category.
    pub category: Category,
    /// Classification confidence.
    pub confidence: Option<f64>,
    /// How the category was produced.
    pub method: ClassificationMethod,
    /// MQ-135 gas index (IoT source).
    pub gas_index: Option<f64>,
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Relative humidity in %.
    pub humidity: Option<f64>,
    /// Pressure in hPa.
    pub pressure: Option<f64>,
    /// When the reading was captured.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl ReadingRecord {
    /// Build a record from a reading and its classification.
    #[must_use]
    pub fn new(reading: &Reading, result: &ClassificationResult) -> Self {
        let pollutants = reading.pollutants.unwrap_or_default();
        let iot = reading.iot.as_ref();
        Self {
            data_source: reading.source,
            location: reading.location.clone(),
            pm10: pollutants.pm10,
            pm25: pollutants.pm25,
            so2: pollutants.so2,
            co: pollutants.co,
            o3: pollutants.o3,
            no2: pollutants.no2,
            category: result.category,
            confidence: result.confidence,
            method: result.method,
            gas_index: iot.map(|r| r.gas_index),
            temperature: iot.and_then(|r| r.temperature),
            humidity: iot.and_then(|r| r.humidity),
            pressure: iot.and_then(|r| r.pressure),
            recorded_at: reading.captured_at,
        }
    }
}

/// Destination for classified readings.
#[async_trait]
pub trait ReadingSink: Send + Sync + fmt::Debug {
    /// Persist one record.
    async fn record(&self, record: &ReadingRecord) -> std::result::Result<(), SinkError>;
}

/// Destination for outbound alerts.
#[async_trait]
pub trait AlertSink: Send + Sync + fmt::Debug {
    /// Deliver one alert.
    async fn send_alert(&self, alert: &AlertPayload) -> std::result::Result<(), SinkError>;
}

/// Reading sink that POSTs each record as JSON.
///
/// When an API key is set it is sent both as an `apikey` header and as a
/// bearer token, which is what hosted REST fronts for Postgres expect.
#[derive(Debug, Clone)]
pub struct HttpReadingSink {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpReadingSink {
    /// Create a sink for the given endpoint.
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(DEFAULT_SINK_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: validate_url(endpoint)?,
            api_key,
        })
    }

    /// The endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReadingSink for HttpReadingSink {
    async fn record(&self, record: &ReadingRecord) -> std::result::Result<(), SinkError> {
        let mut request = self.client.post(&self.endpoint).json(record);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| SinkError::NotReachable {
            url: self.endpoint.clone(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Alert sink that posts rendered alerts to a Telegram chat.
pub struct TelegramAlertSink {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl fmt::Debug for TelegramAlertSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramAlertSink")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramAlertSink {
    /// Create a sink against the public Bot API.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        Self::with_api_base(DEFAULT_TELEGRAM_API_BASE, bot_token, chat_id)
    }

    /// Create a sink against a custom Bot API base URL.
    pub fn with_api_base(
        api_base: &str,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(DEFAULT_SINK_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: validate_url(api_base)?,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl AlertSink for TelegramAlertSink {
    async fn send_alert(&self, alert: &AlertPayload) -> std::result::Result<(), SinkError> {
        let text = render_push_alert(alert);
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: &text,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await
            // The request URL carries the bot token.
            .map_err(|e| SinkError::NotReachable {
                url: self.api_base.clone(),
                source: e.without_url(),
            })?;

        let status = response.status();
        let raw = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TelegramResponse>(&raw) {
            Ok(TelegramResponse { ok: true, .. }) => Ok(()),
            Ok(TelegramResponse { description, .. }) => Err(SinkError::Rejected(
                description.unwrap_or_else(|| format!("status {}", status.as_u16())),
            )),
            Err(_) => Err(SinkError::Status {
                status: status.as_u16(),
                message: raw,
            }),
        }
    }
}
