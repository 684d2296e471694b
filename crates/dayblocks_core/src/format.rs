//! Display helpers for hours, durations and countdowns.

/// Formats an hour of day (`0..=23`) as a 12-hour label: `0 -> "12 AM"`.
pub fn format_time(hour: u32) -> String {
    let period = if hour % 24 >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{display_hour} {period}")
}

/// Formats minutes as `"1h 30m"`, dropping a zero half (`"1h"`, `"45m"`).
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, mins) => format!("{mins}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, mins) => format!("{hours}h {mins}m"),
    }
}

/// Parses `"1h 30m"`, `"1.5h"` or `"30m"` into whole minutes.
///
/// Returns `None` for any other shape or for negative values.
pub fn parse_duration(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    if let Some((hours_part, minutes_part)) = trimmed.split_once(' ') {
        let hours = parse_number(hours_part.strip_suffix('h')?)?;
        let minutes = parse_number(minutes_part.trim().strip_suffix('m')?)?;
        return to_minutes(hours * 60.0 + minutes);
    }
    if let Some(hours) = trimmed.strip_suffix('h') {
        return to_minutes(parse_number(hours)? * 60.0);
    }
    if let Some(minutes) = trimmed.strip_suffix('m') {
        return to_minutes(parse_number(minutes)?);
    }
    None
}

/// Formats seconds as a zero-padded `"MM:SS"` countdown display.
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn parse_number(text: &str) -> Option<f64> {
    let value = text.trim().parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn to_minutes(value: f64) -> Option<u32> {
    let rounded = value.round();
    (rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}
