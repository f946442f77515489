//! Terminal text styling
//!
//! Uses ANSI escape codes for colors. [`PlainStyling`] passes text through
//! untouched for pipes, tests and `--no-color`.

use crate::config::Color;

const RESET: &str = "\x1b[0m";
const BRIGHT: u8 = 1;
const FG_BASE: u8 = 30;
const BG_BASE: u8 = 40;

/// Wraps text in color for display
pub trait TextStyling: Send + Sync {
    fn colorize(&self, color: Color, text: &str) -> String;
}

/// Bright foreground on a black background
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiStyling;

impl TextStyling for AnsiStyling {
    fn colorize(&self, color: Color, text: &str) -> String {
        format!(
            "\x1b[{};{};{}m{}{}",
            BRIGHT,
            FG_BASE + color.ansi_offset(),
            BG_BASE + Color::Black.ansi_offset(),
            text,
            RESET
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainStyling;

impl TextStyling for PlainStyling {
    fn colorize(&self, _color: Color, text: &str) -> String {
        text.to_string()
    }
}

/// Pick a styling for the configured color setting
pub fn for_color(enabled: bool) -> Box<dyn TextStyling> {
    if enabled {
        Box::new(AnsiStyling)
    } else {
        Box::new(PlainStyling)
    }
}

impl<T: TextStyling + ?Sized> TextStyling for Box<T> {
    fn colorize(&self, color: Color, text: &str) -> String {
        (**self).colorize(color, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_colorize() {
        let colored = AnsiStyling.colorize(Color::Red, "test");
        assert_eq!(colored, "\x1b[1;31;40mtest\x1b[0m");
    }

    #[test]
    fn test_plain_is_passthrough() {
        assert_eq!(PlainStyling.colorize(Color::Red, "test"), "test");
        assert_eq!(for_color(false).colorize(Color::Green, "x"), "x");
        assert!(for_color(true).colorize(Color::Green, "x").contains("\x1b[1;32;40m"));
    }
}
