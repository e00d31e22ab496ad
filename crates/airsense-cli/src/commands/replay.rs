//! Replay command implementation.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use airsense_core::{AirQualityMonitor, Config, MonitorEvent, Reading};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::{local_monitor, run_stream};
use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_summary};
use crate::util::write_output;

/// How long to wait for in-flight sink deliveries before exiting.
const SINK_GRACE: Duration = Duration::from_secs(2);

pub async fn cmd_replay(
    file: &Path,
    local: bool,
    config: &Config,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    let (readings, unparsed) = if file == Path::new("-") {
        parse_readings(io::stdin().lock())?
    } else {
        let handle =
            File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
        parse_readings(BufReader::new(handle))?
    };
    info!("Replaying {} readings", readings.len());

    let monitor = if local {
        local_monitor(config)
    } else {
        AirQualityMonitor::from_config(config).context("Failed to build monitor from config")?
    };
    let mut events = monitor.subscribe();
    let has_sinks = !local && (config.history.endpoint.is_some() || config.telegram.credentials().is_some());

    let (mut content, mut summary) = run_stream(&monitor, readings, format, opts).await?;
    summary.rejected += unparsed;

    if has_sinks {
        debug!("Waiting for sink deliveries");
        tokio::time::sleep(SINK_GRACE).await;
    }
    while let Ok(event) = events.try_recv() {
        if let MonitorEvent::SinkFailed { sink, error } = event {
            warn!(?sink, "Sink delivery failed: {}", error);
        }
    }

    if format == OutputFormat::Text && !quiet {
        content.push_str(&format_summary(&summary, opts));
    }
    write_output(output, &content)
}

/// Parse a JSON-lines reading log.
///
/// Blank lines and lines starting with `#` are skipped. Lines that do not
/// parse are logged and counted.
fn parse_readings(reader: impl BufRead) -> Result<(Vec<Reading>, usize)> {
    let mut readings = Vec::new();
    let mut unparsed = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read reading log")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<Reading>(line) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                warn!(line = index + 1, "Skipping unparseable reading: {}", e);
                unparsed += 1;
            }
        }
    }

    Ok((readings, unparsed))
}
