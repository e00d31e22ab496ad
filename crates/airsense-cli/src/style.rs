//! Visual styling utilities for the CLI.
//!
//! Category colors follow the usual AQI palette: green, yellow, orange,
//! red, and purple for hazardous.

use owo_colors::OwoColorize;

use airsense_types::{Category, Direction};

/// Format a category label with its palette color.
pub fn format_category_colored(category: Category, no_color: bool) -> String {
    let label = category.to_string();
    if no_color {
        return label;
    }

    match category {
        Category::Good => format!("{}", label.green()),
        Category::Moderate => format!("{}", label.yellow()),
        // Orange color (RGB: 255, 165, 0)
        Category::UnhealthyForSensitive => format!("{}", label.truecolor(255, 165, 0)),
        Category::VeryUnhealthy => format!("{}", label.red()),
        Category::Hazardous => format!("{}", label.magenta().bold()),
    }
}

/// Format a direction with an arrow.
pub fn format_direction(direction: Direction, no_color: bool) -> String {
    let text = match direction {
        Direction::Improved => "▼ improved",
        Direction::Worsened => "▲ worsened",
        Direction::Same => "= same",
        Direction::Initial => "• initial",
    };
    if no_color {
        return text.to_string();
    }
    match direction {
        Direction::Improved => format!("{}", text.green()),
        Direction::Worsened => format!("{}", text.red()),
        Direction::Same | Direction::Initial => format!("{}", text.dimmed()),
    }
}

/// Format a confidence in `[0, 1]` as a percentage.
pub fn format_confidence(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) => format!("{:.0}%", c * 100.0),
        None => "N/A".to_string(),
    }
}

/// Highlight a notification line.
pub fn format_notification(message: &str, no_color: bool) -> String {
    if no_color {
        format!("! {}", message)
    } else {
        format!("{} {}", "!".yellow().bold(), message.bold())
    }
}

/// Dim secondary text.
pub fn dim(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.dimmed())
    }
}
