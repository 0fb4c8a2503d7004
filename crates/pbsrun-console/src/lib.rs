//! Interactive terminal display for pbsrun.

pub mod reporter;
pub mod theme;

pub use reporter::{clear_screen, frame_error, frame_result, ConsoleReporter};
pub use theme::Theme;
