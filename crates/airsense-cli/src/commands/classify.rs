//! Classify command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use airsense_core::{
    Config, HttpInferenceClient, ReadingValidator, RemoteClassifier, ThresholdClassifier,
};
use airsense_types::PollutantVector;
use anyhow::{Context, Result};

use super::check_validation;
use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_result_json, format_result_text};
use crate::util::write_output;

pub async fn cmd_classify(
    vector: PollutantVector,
    model: bool,
    config: &Config,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    check_validation(&ReadingValidator::default().validate_pollutants(&vector))?;

    let threshold = ThresholdClassifier::new(config.breakpoints.clone());
    let result = if model {
        let endpoint = config.inference.endpoint.as_deref().context(
            "No inference endpoint configured. Set [inference] endpoint in the config file.",
        )?;
        let timeout = config.inference.timeout();
        let client = HttpInferenceClient::new(endpoint, timeout)
            .context("Failed to create inference client")?;
        RemoteClassifier::new(Arc::new(client), threshold.clone())
            .timeout(timeout)
            .default_confidence(config.inference.default_confidence)
            .classify(&vector)
            .await
    } else {
        threshold.classify(&vector)
    };

    let content = match format {
        OutputFormat::Json => format_result_json(&result, opts)?,
        OutputFormat::Text => {
            format_result_text(&result, Some(threshold.severities(&vector)), opts)
        }
    };
    write_output(output, &content)
}
