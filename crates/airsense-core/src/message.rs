//! Alert text for in-app toasts and outbound push alerts.
//!
//! Both functions here are pure: identical arguments always give
//! byte-identical strings, so the toast and the push alert never disagree.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

use airsense_types::{Category, DataSource, Direction, PollutantVector};

/// Format the short alert message for a category change.
///
/// ```
/// use airsense_core::format_alert;
/// use airsense_types::Category;
///
/// assert_eq!(
///     format_alert(Category::Good, None, None, None),
///     "Air quality is currently Good."
/// );
/// assert_eq!(
///     format_alert(Category::Moderate, Some(Category::Hazardous), Some("Bandung"), None),
///     "Air quality in Bandung improved from Hazardous to Moderate."
/// );
/// ```
#[must_use]
pub fn format_alert(
    category: Category,
    previous: Option<Category>,
    location: Option<&str>,
    pollutants: Option<&PollutantVector>,
) -> String {
    let place = location
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| format!(" in {}", l))
        .unwrap_or_default();

    let mut message = match previous.map(|p| (p, Direction::between(p, category))) {
        None => format!("Air quality{} is currently {}.", place, category),
        Some((previous, Direction::Worsened)) => {
            let mut text = format!(
                "Air quality{} declined from {} to {}.",
                place, previous, category
            );
            let advice = category.advice();
            if !advice.is_empty() {
                text.push(' ');
                text.push_str(advice);
            }
            text
        }
        Some((previous, Direction::Improved)) => format!(
            "Air quality{} improved from {} to {}.",
            place, previous, category
        ),
        Some(_) => format!("Air quality{} remains: {}.", place, category),
    };

    if let Some(snapshot) = pollutants.and_then(pollutant_summary) {
        message.push_str(" Readings: ");
        message.push_str(&snapshot);
        message.push('.');
    }

    message
}

fn pollutant_summary(pollutants: &PollutantVector) -> Option<String> {
    let parts: Vec<String> = pollutants
        .present()
        .filter(|(_, v)| v.is_finite())
        .map(|(p, v)| format!("{} {:.1} {}", p.name(), v, p.unit()))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Everything an outbound alert sink needs to deliver one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Unique notification id.
    pub id: Uuid,
    /// Category that triggered the alert.
    pub category: Category,
    /// Category the stream moved away from.
    pub previous: Option<Category>,
    /// Direction of the change.
    pub direction: Direction,
    /// The short message shown in-app.
    pub message: String,
    /// Location of the reading.
    pub location: Option<String>,
    /// Provider the reading came from.
    pub source: DataSource,
    /// Pollutant snapshot, if the reading had one.
    pub pollutants: Option<PollutantVector>,
    /// When the alert was raised.
    #[serde(with = "time::serde::rfc3339")]
    pub raised_at: OffsetDateTime,
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━";

/// Render the Markdown body of a push alert.
///
/// Times are shown in UTC with minute precision.
#[must_use]
pub fn render_push_alert(payload: &AlertPayload) -> String {
    let mut msg = String::new();

    let _ = writeln!(msg, "{} *AIRSENSE ALERT*", category_marker(payload.category));
    let _ = writeln!(msg, "{}\n", RULE);

    let (trend_marker, headline) = match payload.direction {
        Direction::Worsened => ("⚠️", "AIR QUALITY DECLINED"),
        Direction::Improved => ("✅", "AIR QUALITY IMPROVED"),
        Direction::Same | Direction::Initial => ("ℹ️", "AIR QUALITY UPDATE"),
    };
    let _ = writeln!(msg, "{} *{}*\n", trend_marker, headline);

    let _ = writeln!(msg, "🏷 *Status:* `{}`", payload.category.label());
    if let Some(previous) = payload.previous {
        let _ = writeln!(msg, "↩️ *Previous:* `{}`", previous.label());
    }
    if let Some(location) = payload.location.as_deref().filter(|l| !l.trim().is_empty()) {
        let _ = writeln!(msg, "📍 *Location:* {}", location.trim());
    }
    let _ = writeln!(msg, "{} *Source:* {}", source_marker(payload.source), payload.source);
    let _ = writeln!(msg, "🕐 *Time:* {}\n", format_time(payload.raised_at));

    if let Some(pollutants) = payload.pollutants.as_ref()
        && !pollutants.is_empty()
    {
        let _ = writeln!(msg, "📊 *Pollutants*");
        msg.push_str("```\n");
        for (pollutant, value) in pollutants.present().filter(|(_, v)| v.is_finite()) {
            let _ = writeln!(
                msg,
                "{:<6} : {:.1} {}",
                pollutant.name(),
                value,
                pollutant.unit()
            );
        }
        msg.push_str("```\n\n");
    }

    let advice = payload.category.advice();
    if !advice.is_empty() {
        let _ = writeln!(msg, "💡 *Advice:* {}\n", advice);
    }

    let _ = writeln!(msg, "{}", RULE);
    msg.push_str("_Powered by AirSense_ 🌐");
    msg
}

fn category_marker(category: Category) -> &'static str {
    match category {
        Category::Good => "🟢",
        Category::Moderate => "🟡",
        Category::UnhealthyForSensitive => "🟠",
        Category::VeryUnhealthy => "🔴",
        Category::Hazardous => "☠️",
    }
}

fn source_marker(source: DataSource) -> &'static str {
    match source {
        DataSource::Iot => "📡",
        DataSource::OpenWeatherMap => "🌤",
        DataSource::OpenAq => "🌍",
    }
}

fn format_time(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
    at.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
