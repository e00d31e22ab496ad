//! CLI argument definitions using clap.

use std::path::PathBuf;

use airsense_types::{DataSource, IoTReading, Pollutant, PollutantVector};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Pollutant concentrations (µg/m³, CO in mg/m³)
#[derive(Debug, Clone, Default, Args)]
pub struct PollutantArgs {
    /// PM10 concentration
    #[arg(long)]
    pub pm10: Option<f64>,

    /// PM2.5 concentration
    #[arg(long)]
    pub pm25: Option<f64>,

    /// SO₂ concentration
    #[arg(long)]
    pub so2: Option<f64>,

    /// CO concentration (mg/m³)
    #[arg(long)]
    pub co: Option<f64>,

    /// O₃ concentration
    #[arg(long)]
    pub o3: Option<f64>,

    /// NO₂ concentration
    #[arg(long)]
    pub no2: Option<f64>,

    /// Precomputed composite index sent to the model as its seventh feature
    #[arg(long)]
    pub max: Option<f64>,
}

impl PollutantArgs {
    /// Collect the flags into a vector.
    pub fn to_vector(&self) -> PollutantVector {
        let mut vector = PollutantVector::new();
        let values = [self.pm10, self.pm25, self.so2, self.co, self.o3, self.no2];
        for (pollutant, value) in Pollutant::ALL.into_iter().zip(values) {
            vector.set(pollutant, value);
        }
        vector.max = self.max;
        vector
    }
}

/// IoT sensor values
#[derive(Debug, Clone, Args)]
pub struct SensorArgs {
    /// MQ-135 derived gas index
    #[arg(short, long)]
    pub gas_index: f64,

    /// Temperature in °C
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Relative humidity in %
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Pressure in hPa
    #[arg(long)]
    pub pressure: Option<f64>,
}

impl SensorArgs {
    /// Collect the flags into a sensor reading.
    pub fn to_reading(&self) -> IoTReading {
        IoTReading {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            ..IoTReading::new(self.gas_index)
        }
    }
}

#[derive(Parser)]
#[command(name = "airsense")]
#[command(author, version, about = "Air quality classification for AirSense", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "AIRSENSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify one set of pollutant concentrations
    Classify {
        #[command(flatten)]
        pollutants: PollutantArgs,

        /// Ask the configured inference endpoint instead of local rules
        #[arg(short, long)]
        model: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Classify an IoT sensor reading
    Iot {
        #[command(flatten)]
        sensor: SensorArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Replay a JSON-lines reading log through one stream
    Replay {
        /// Reading log, one JSON reading per line ("-" for stdin)
        file: PathBuf,

        /// Use local rules only and skip persistence and push alerts
        #[arg(long)]
        local: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a synthetic reading stream through one stream
    Simulate {
        /// Data source to simulate
        #[arg(short, long, default_value = "openaq", value_parser = parse_source)]
        source: DataSource,

        /// Number of readings
        #[arg(short = 'n', long, default_value = "12")]
        count: u32,

        /// Simulated seconds between readings
        #[arg(long, default_value = "300")]
        step_secs: u64,

        /// Random seed for a reproducible stream
        #[arg(long)]
        seed: Option<u64>,

        /// Location attached to every reading
        #[arg(short, long, default_value = "Jakarta")]
        location: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse a data source name
fn parse_source(s: &str) -> Result<DataSource, String> {
    s.parse::<DataSource>().map_err(|e| e.to_string())
}
