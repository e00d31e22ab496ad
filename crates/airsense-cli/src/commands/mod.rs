//! Command implementations for the CLI.

mod classify;
mod config;
mod iot;
mod replay;
mod simulate;

pub use classify::cmd_classify;
pub use config::cmd_config;
pub use iot::cmd_iot;
pub use replay::cmd_replay;
pub use simulate::{SimulateArgs, cmd_simulate};

use airsense_core::{AirQualityMonitor, Config, Error, Reading, ValidationResult};
use anyhow::{Result, bail};
use tracing::warn;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, StreamSummary, format_outcome_json, format_outcome_line};

/// Log soft validation warnings and reject readings with fatal ones.
pub(crate) fn check_validation(validation: &ValidationResult) -> Result<()> {
    if !validation.is_valid {
        let problems = validation
            .warnings
            .iter()
            .filter(|w| w.is_fatal())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        bail!("Invalid reading: {}", problems);
    }
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    Ok(())
}

/// A monitor that uses the configured rules but no remote model or sinks.
pub(crate) fn local_monitor(config: &Config) -> AirQualityMonitor {
    AirQualityMonitor::new()
        .thresholds(config.breakpoints.clone())
        .iot(config.iot.clone())
        .suppression_window(config.notifications.suppression_window())
        .notifications(config.notifications.enabled)
}

/// Push readings through one monitor in order and render each step.
///
/// Readings the monitor rejects are logged and counted, not fatal.
pub(crate) async fn run_stream(
    monitor: &AirQualityMonitor,
    readings: impl IntoIterator<Item = Reading>,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<(String, StreamSummary)> {
    let mut content = String::new();
    let mut summary = StreamSummary::default();

    for reading in readings {
        let outcome = match monitor.process(reading.clone()).await {
            Ok(outcome) => outcome,
            Err(e @ (Error::InvalidReading(_) | Error::MissingInput(_))) => {
                warn!(source = %reading.source, "Skipping reading: {}", e);
                summary.rejected += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        summary.record(&outcome);
        match format {
            OutputFormat::Json => content.push_str(&format_outcome_json(&reading, &outcome)?),
            OutputFormat::Text => content.push_str(&format_outcome_line(&reading, &outcome, opts)),
        }
    }

    Ok((content, summary))
}
