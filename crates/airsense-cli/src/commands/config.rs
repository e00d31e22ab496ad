//! Config command implementation.

use std::path::{Path, PathBuf};

use airsense_core::Config;
use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::util::{config_path, load_config, write_output};

pub fn cmd_config(
    action: ConfigAction,
    explicit: Option<&Path>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let path = config_path(explicit);
    match action {
        ConfigAction::Path => write_output(output, &format!("{}\n", path.display())),
        ConfigAction::Show => {
            // An explicit path that does not exist yet shows the defaults.
            let config = if path.exists() {
                load_config(Some(path.as_path()))?
            } else {
                Config::default()
            };
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize config")?;
            write_output(output, &content)
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Config::default()
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}
