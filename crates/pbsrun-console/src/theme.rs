//! Color themes.

use crossterm::style::{Color, Stylize};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub header: Option<Color>,
    pub success: Option<Color>,
    pub warning: Option<Color>,
    pub error: Option<Color>,
}

impl Theme {
    pub fn colored() -> Self {
        Self {
            header: Some(Color::Magenta),
            success: Some(Color::Green),
            warning: Some(Color::Yellow),
            error: Some(Color::Red),
        }
    }

    /// No escape sequences, for pipes and tests.
    pub fn plain() -> Self {
        Self {
            header: None,
            success: None,
            warning: None,
            error: None,
        }
    }

    pub fn paint(text: &str, color: Option<Color>) -> String {
        match color {
            Some(color) => text.with(color).to_string(),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paint_is_identity() {
        assert_eq!(Theme::paint("OK", Theme::plain().success), "OK");
    }

    #[test]
    fn test_colored_paint_wraps_text() {
        let painted = Theme::paint("FAIL", Theme::colored().error);
        assert!(painted.contains("FAIL"));
    }
}
