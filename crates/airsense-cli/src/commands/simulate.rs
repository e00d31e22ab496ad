//! Simulate command implementation.

use std::path::PathBuf;

use airsense_core::{Config, Reading};
use airsense_types::{DataSource, IoTReading, Pollutant, PollutantVector};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::OffsetDateTime;
use tracing::info;

use super::{local_monitor, run_stream};
use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_summary};
use crate::util::write_output;

/// Arguments for the simulate command.
#[derive(Debug, Clone)]
pub struct SimulateArgs {
    pub source: DataSource,
    pub count: u32,
    pub step_secs: u64,
    pub seed: Option<u64>,
    pub location: String,
}

/// Plausible urban ranges per pollutant (µg/m³, CO in mg/m³).
const POLLUTANT_RANGES: [(Pollutant, f64, f64); 6] = [
    (Pollutant::Pm10, 45.0, 105.0),
    (Pollutant::Pm25, 25.0, 70.0),
    (Pollutant::So2, 10.0, 40.0),
    (Pollutant::Co, 0.5, 2.5),
    (Pollutant::O3, 30.0, 80.0),
    (Pollutant::No2, 15.0, 55.0),
];

const GAS_INDEX_MIN: f64 = 40.0;
const GAS_INDEX_MAX: f64 = 260.0;
const GAS_INDEX_STEP: f64 = 45.0;

pub async fn cmd_simulate(
    args: SimulateArgs,
    config: &Config,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    info!(
        source = %args.source,
        count = args.count,
        seed = ?args.seed,
        "Simulating reading stream"
    );

    let readings = generate(&args, &mut rng, OffsetDateTime::now_utc());
    let monitor = local_monitor(config);
    let (mut content, summary) = run_stream(&monitor, readings, format, opts).await?;

    if format == OutputFormat::Text && !quiet {
        content.push_str(&format_summary(&summary, opts));
    }
    write_output(output, &content)
}

/// Generate `args.count` readings spaced `args.step_secs` apart from `start`.
fn generate(args: &SimulateArgs, rng: &mut impl Rng, start: OffsetDateTime) -> Vec<Reading> {
    let step = time::Duration::seconds(i64::try_from(args.step_secs).unwrap_or(i64::MAX));
    let mut gas_index = rng.random_range(GAS_INDEX_MIN..GAS_INDEX_MAX);
    let mut at = start;
    let mut readings = Vec::with_capacity(args.count as usize);

    for _ in 0..args.count {
        let reading = if args.source.is_iot() {
            gas_index = (gas_index + rng.random_range(-GAS_INDEX_STEP..GAS_INDEX_STEP))
                .clamp(GAS_INDEX_MIN, GAS_INDEX_MAX);
            Reading::from_iot(IoTReading {
                temperature: Some(round1(rng.random_range(24.0..34.0))),
                humidity: Some(round1(rng.random_range(55.0..90.0))),
                pressure: Some(round1(rng.random_range(1005.0..1015.0))),
                ..IoTReading::new(round1(gas_index))
            })
        } else {
            let mut vector = PollutantVector::new();
            for (pollutant, low, high) in POLLUTANT_RANGES {
                vector.set(pollutant, Some(round1(rng.random_range(low..high))));
            }
            Reading::from_pollutants(args.source, vector)
        };
        readings.push(reading.with_location(args.location.as_str()).captured_at(at));
        at = at.saturating_add(step);
    }

    readings
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
