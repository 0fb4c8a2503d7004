//! Time parsing utilities for scheduler output.

use std::time::Duration;

/// Parse a duration in the formats PBS prints for used and elapsed time.
///
/// Supports:
/// - HH:MM:SS
/// - HH:MM (walltime columns of `qstat -a`)
/// - Seconds as integer
///
/// Returns None for empty strings and placeholders.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() || s == "-" || s == "--" {
        return None;
    }

    let parts: Vec<u64> = s
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<Vec<_>>>()?;

    let seconds = match parts.as_slice() {
        [h, m, sec] => h * 3600 + m * 60 + sec,
        [h, m] => h * 3600 + m * 60,
        [sec] => *sec,
        _ => return None,
    };

    Some(Duration::from_secs(seconds))
}

/// Whether a queue field looks like a clock value (`MM:SS`, `HH:MM` or `HH:MM:SS`).
pub fn is_time_value(s: &str) -> bool {
    s.contains(':') && parse_duration(s).is_some()
}

/// Format seconds as human-readable duration (e.g., "1d 02:30:00", "01:30:00", "05:30").
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours >= 24 {
        let days = hours / 24;
        let hours = hours % 24;
        format!("{}d {:02}:{:02}:{:02}", days, hours, mins, secs)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
