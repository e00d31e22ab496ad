//! Test doubles for the inference client and the sinks.
//!
//! [`MockInferenceClient`] replays scripted outcomes and records what it was
//! asked. [`RecordingSink`] keeps everything it receives and can be told to
//! fail, which is enough to drive the monitor end to end without a network.
//!
//! # Features
//!
//! - **Scripted outcomes**: queue predictions, fallback requests or errors
//! - **Latency simulation**: delay every call to exercise timeouts
//! - **Failure injection**: make a sink reject every delivery

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::inference::{InferenceClient, InferenceOutcome, InferenceRequest, Prediction};
use crate::message::AlertPayload;
use crate::sinks::{AlertSink, ReadingRecord, ReadingSink, SinkError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A scripted inference client.
///
/// Queued outcomes are returned in order; once the queue is empty every
/// call returns the default outcome, a confident `BAIK` prediction.
///
/// # Example
///
/// ```
/// use airsense_core::MockInferenceClient;
/// use airsense_core::inference::{InferenceClient, InferenceOutcome, InferenceRequest};
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = MockInferenceClient::new();
/// client.push(InferenceOutcome::FallbackRequested("maintenance".into()));
///
/// let request = InferenceRequest::new([0.0; 7]);
/// assert!(matches!(
///     client.predict(&request).await,
///     InferenceOutcome::FallbackRequested(_)
/// ));
/// assert!(matches!(client.predict(&request).await, InferenceOutcome::Prediction(_)));
/// assert_eq!(client.call_count(), 2);
/// # }
/// ```
pub struct MockInferenceClient {
    queue: Mutex<VecDeque<InferenceOutcome>>,
    default: Mutex<InferenceOutcome>,
    /// Simulated latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    calls: AtomicU32,
    last_request: Mutex<Option<InferenceRequest>>,
}

impl std::fmt::Debug for MockInferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInferenceClient")
            .field("queued", &lock(&self.queue).len())
            .field("calls", &self.calls.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceClient {
    /// Create a client that always predicts `BAIK` with confidence 0.95.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default: Mutex::new(InferenceOutcome::Prediction(Prediction {
                label: "BAIK".to_string(),
                confidence: Some(0.95),
            })),
            latency_ms: AtomicU64::new(0),
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a client with a queue of outcomes.
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = InferenceOutcome>) -> Self {
        let client = Self::new();
        lock(&client.queue).extend(outcomes);
        client
    }

    /// Queue one outcome.
    pub fn push(&self, outcome: InferenceOutcome) {
        lock(&self.queue).push_back(outcome);
    }

    /// Replace the outcome returned once the queue is empty.
    pub fn set_default(&self, outcome: InferenceOutcome) {
        *lock(&self.default) = outcome;
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<InferenceRequest> {
        *lock(&self.last_request)
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn predict(&self, request: &InferenceRequest) -> InferenceOutcome {
        self.calls.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_request) = Some(*request);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let queued = lock(&self.queue).pop_front();
        queued.unwrap_or_else(|| lock(&self.default).clone())
    }
}

/// One delivery attempt seen by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkDelivery {
    /// A reading record.
    Record(ReadingRecord),
    /// An outbound alert.
    Alert(AlertPayload),
}

/// A sink that keeps everything it is given.
///
/// Implements both [`ReadingSink`] and [`AlertSink`]. Attempts are also
/// forwarded to a channel when created with [`RecordingSink::with_channel`],
/// so async tests can wait for the spawned delivery instead of polling.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<ReadingRecord>>,
    alerts: Mutex<Vec<AlertPayload>>,
    should_fail: AtomicBool,
    notify: Option<mpsc::UnboundedSender<SinkDelivery>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that also reports every attempt on a channel.
    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<SinkDelivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            notify: Some(tx),
            ..Self::default()
        };
        (sink, rx)
    }

    /// Make every delivery fail (attempts are still reported).
    pub fn set_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Records accepted so far.
    pub fn records(&self) -> Vec<ReadingRecord> {
        lock(&self.records).clone()
    }

    /// Alerts accepted so far.
    pub fn alerts(&self) -> Vec<AlertPayload> {
        lock(&self.alerts).clone()
    }

    fn report(&self, delivery: SinkDelivery) {
        if let Some(tx) = &self.notify {
            let _ = tx.send(delivery);
        }
    }

    fn check_should_fail(&self) -> Result<(), SinkError> {
        if self.should_fail.load(Ordering::Relaxed) {
            Err(SinkError::Other("Mock sink failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReadingSink for RecordingSink {
    async fn record(&self, record: &ReadingRecord) -> Result<(), SinkError> {
        let outcome = self.check_should_fail();
        if outcome.is_ok() {
            lock(&self.records).push(record.clone());
        }
        self.report(SinkDelivery::Record(record.clone()));
        outcome
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send_alert(&self, alert: &AlertPayload) -> Result<(), SinkError> {
        let outcome = self.check_should_fail();
        if outcome.is_ok() {
            lock(&self.alerts).push(alert.clone());
        }
        self.report(SinkDelivery::Alert(alert.clone()));
        outcome
    }
}
