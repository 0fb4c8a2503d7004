//! Shared parsing and execution utilities for scheduler output.
//!
//! This crate provides the command runner and field parsers used by
//! pbsrun-pbs and pbsrun-core.

pub mod command;
pub mod time;

pub use command::{describe, run_command, CommandError, CommandResult};
pub use time::{format_duration, is_time_value, parse_duration};

/// Filter helper for optional string fields.
/// Returns None if the string is empty or a placeholder value.
pub fn non_empty_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "--" || trimmed == "N/A" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_string() {
        assert_eq!(non_empty_string("00:05"), Some("00:05".to_string()));
        assert_eq!(non_empty_string("  batch  "), Some("batch".to_string()));
        assert_eq!(non_empty_string(""), None);
        assert_eq!(non_empty_string("-"), None);
        assert_eq!(non_empty_string("--"), None);
        assert_eq!(non_empty_string("N/A"), None);
    }
}
