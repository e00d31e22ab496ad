//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use airsense_core::{Config, default_config_path};
use anyhow::{Context, Result};

/// Resolve the configuration path: the explicit one if given, else the default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(default_config_path)
}

/// Load and validate the configuration.
///
/// An explicit path must exist. The default path falls back to built-in
/// defaults when no file is present.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load_validated(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let config = Config::load_default().context("Failed to load config")?;
            config.validate().context("Invalid config")?;
            Ok(config)
        }
    }
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
