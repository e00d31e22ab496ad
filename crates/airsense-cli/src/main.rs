//! AirSense command-line interface.

mod cli;
mod commands;
mod format;
mod style;
mod util;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{SimulateArgs, cmd_classify, cmd_config, cmd_iot, cmd_replay, cmd_simulate};
use format::FormatOptions;
use util::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "airsense", &mut io::stdout());
        return Ok(());
    }

    // Logs go to stderr so JSON output on stdout stays clean
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    let opts = FormatOptions::new(cli.no_color, cli.compact);
    let output = cli.output.as_ref();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Classify {
            pollutants,
            model,
            output: out,
        } => {
            let config = load_config(config_path)?;
            cmd_classify(
                pollutants.to_vector(),
                model,
                &config,
                out.format,
                output,
                &opts,
            )
            .await?;
        }
        Commands::Iot {
            sensor,
            output: out,
        } => {
            let config = load_config(config_path)?;
            cmd_iot(sensor.to_reading(), &config, out.format, output, &opts)?;
        }
        Commands::Replay {
            file,
            local,
            output: out,
        } => {
            let config = load_config(config_path)?;
            cmd_replay(
                &file, local, &config, out.format, output, cli.quiet, &opts,
            )
            .await?;
        }
        Commands::Simulate {
            source,
            count,
            step_secs,
            seed,
            location,
            output: out,
        } => {
            let config = load_config(config_path)?;
            let args = SimulateArgs {
                source,
                count,
                step_secs,
                seed,
                location,
            };
            cmd_simulate(args, &config, out.format, output, cli.quiet, &opts).await?;
        }
        Commands::Config { action } => {
            cmd_config(action, config_path, output)?;
        }
        Commands::Completions { .. } => unreachable!("handled before logging setup"),
    }

    Ok(())
}
