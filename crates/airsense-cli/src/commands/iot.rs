//! IoT command implementation.

use std::path::PathBuf;

use airsense_core::{Config, IotClassifier, ReadingValidator};
use airsense_types::IoTReading;
use anyhow::Result;

use super::check_validation;
use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_result_json, format_result_text};
use crate::util::write_output;

pub fn cmd_iot(
    reading: IoTReading,
    config: &Config,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    check_validation(&ReadingValidator::default().validate_iot(&reading))?;

    let result = IotClassifier::new(config.iot.clone()).classify(&reading);
    let content = match format {
        OutputFormat::Json => format_result_json(&result, opts)?,
        OutputFormat::Text => format_result_text(&result, None, opts),
    };
    write_output(output, &content)
}
