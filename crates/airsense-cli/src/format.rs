//! Output formatting utilities for text and JSON output.

use std::fmt::Write as _;

use airsense_core::{ClassificationOutcome, Reading};
use airsense_types::{Category, ClassificationResult, InputSnapshot, Pollutant};
use anyhow::Result;
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    at.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Format one classification result as a text block.
///
/// `severities` holds the per-pollutant breakpoint index in feature order,
/// shown next to each present pollutant.
pub fn format_result_text(
    result: &ClassificationResult,
    severities: Option<[u8; 6]>,
    opts: &FormatOptions,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Category:    {}",
        style::format_category_colored(result.category, opts.no_color)
    );
    let _ = writeln!(
        out,
        "Confidence:  {}",
        style::format_confidence(result.confidence)
    );
    let _ = writeln!(out, "Method:      {}", result.method_label());

    match &result.input {
        InputSnapshot::Pollutants(vector) if !vector.is_empty() => {
            let _ = writeln!(out, "Pollutants:");
            for (i, pollutant) in Pollutant::ALL.into_iter().enumerate() {
                let Some(value) = vector.get(pollutant) else {
                    continue;
                };
                let level = severities
                    .and_then(|s| Category::from_rank(s[i]))
                    .map(|c| format!("  {}", style::format_category_colored(c, opts.no_color)))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {:<6} {:>8.1} {:<6}{}",
                    pollutant.name(),
                    value,
                    pollutant.unit(),
                    level
                );
            }
        }
        InputSnapshot::Pollutants(_) => {
            let _ = writeln!(out, "Pollutants:  none reported");
        }
        InputSnapshot::GasIndex(reading) => {
            let _ = writeln!(out, "Gas index:   {:.1}", reading.gas_index);
            if let Some(t) = reading.temperature {
                let _ = writeln!(out, "Temperature: {:.1}°C", t);
            }
            if let Some(h) = reading.humidity {
                let _ = writeln!(out, "Humidity:    {:.0}%", h);
            }
            if let Some(p) = reading.pressure {
                let _ = writeln!(out, "Pressure:    {:.1} hPa", p);
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.category.description());
    let _ = writeln!(
        out,
        "{}",
        style::dim(result.category.recommendation(), opts.no_color)
    );
    out
}

/// Format one classification result as JSON.
pub fn format_result_json(result: &ClassificationResult, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct ResultJson<'a> {
        #[serde(flatten)]
        result: &'a ClassificationResult,
        label: String,
        method_label: &'static str,
        recommendation: &'static str,
    }

    opts.as_json(&ResultJson {
        result,
        label: result.category.to_string(),
        method_label: result.method_label(),
        recommendation: result.category.recommendation(),
    })
}

/// Format one stream step as a single text line, plus the notification if any.
pub fn format_outcome_line(
    reading: &Reading,
    outcome: &ClassificationOutcome,
    opts: &FormatOptions,
) -> String {
    let mut line = format!(
        "{}  {:<15} {:<24} {:>4}  {:<10} {}\n",
        style::dim(&format_timestamp(reading.captured_at), opts.no_color),
        reading.source.to_string(),
        // Padding is applied to the plain label; color codes would skew it.
        pad_colored(outcome.result.category, 24, opts.no_color),
        style::format_confidence(outcome.result.confidence),
        outcome.result.method_label(),
        style::format_direction(outcome.decision.direction, opts.no_color),
    );
    if let Some(message) = &outcome.decision.message {
        line.push_str("    ");
        line.push_str(&style::format_notification(message, opts.no_color));
        line.push('\n');
    }
    line
}

fn pad_colored(category: Category, width: usize, no_color: bool) -> String {
    let plain = category.to_string();
    let padding = width.saturating_sub(plain.chars().count());
    format!(
        "{}{}",
        style::format_category_colored(category, no_color),
        " ".repeat(padding)
    )
}

/// Format one stream step as a compact JSON line.
pub fn format_outcome_json(reading: &Reading, outcome: &ClassificationOutcome) -> Result<String> {
    #[derive(Serialize)]
    struct OutcomeJson<'a> {
        reading: &'a Reading,
        result: &'a ClassificationResult,
        decision: &'a airsense_types::NotificationDecision,
    }

    let json = serde_json::to_string(&OutcomeJson {
        reading,
        result: &outcome.result,
        decision: &outcome.decision,
    })?;
    Ok(json + "\n")
}

/// Totals for a replayed or simulated stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub readings: usize,
    pub notifications: usize,
    pub rejected: usize,
    pub worst: Option<Category>,
}

impl StreamSummary {
    /// Account for one processed reading.
    pub fn record(&mut self, outcome: &ClassificationOutcome) {
        self.readings += 1;
        if outcome.decision.should_notify {
            self.notifications += 1;
        }
        self.worst = self.worst.max(Some(outcome.result.category));
    }
}

/// Format the closing summary line.
pub fn format_summary(summary: &StreamSummary, opts: &FormatOptions) -> String {
    let worst = summary
        .worst
        .map(|c| style::format_category_colored(c, opts.no_color))
        .unwrap_or_else(|| "N/A".to_string());
    let mut line = format!(
        "\n{} readings, {} notifications, worst: {}",
        summary.readings, summary.notifications, worst
    );
    if summary.rejected > 0 {
        let _ = write!(line, ", {} rejected", summary.rejected);
    }
    line.push('\n');
    line
}
