//! Example: Classifying a Reading Stream
//!
//! This example feeds a short synthetic OpenAQ stream through a monitor and
//! prints each classification and every notification the tracker lets
//! through.
//!
//! Run with: `cargo run --example classify_stream`

use airsense_core::{AirQualityMonitor, MonitorEvent, Reading};
use airsense_types::{DataSource, Pollutant, PollutantVector};
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let monitor = AirQualityMonitor::new();
    let mut events = monitor.subscribe();
    let start = OffsetDateTime::now_utc();

    let pm25 = [8.0, 12.0, 48.0, 160.0, 40.0, 9.0];
    for (i, value) in pm25.into_iter().enumerate() {
        let reading = Reading::from_pollutants(
            DataSource::OpenAq,
            PollutantVector::new()
                .with(Pollutant::Pm25, value)
                .with(Pollutant::Pm10, value * 1.6),
        )
        .with_location("Jakarta")
        .captured_at(start + time::Duration::minutes(15 * i as i64));

        let outcome = monitor.process(reading).await?;
        println!(
            "PM2.5 {:>6.1} -> {:<24} ({}, {:.2})",
            value,
            outcome.result.category.to_string(),
            outcome.result.method_label(),
            outcome.result.confidence.unwrap_or_default()
        );
    }

    println!();
    println!("Notifications:");
    while let Ok(event) = events.try_recv() {
        if let MonitorEvent::Notification { alert } = event {
            println!("  {}", alert.message);
        }
    }

    Ok(())
}
