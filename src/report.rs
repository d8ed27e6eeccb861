// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Shared terminal reporting helpers.

/// Console highlight tints used by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Yellow,
    Green,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31;1m",
            Color::Yellow => "\x1b[33;1m",
            Color::Green => "\x1b[32;1m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Wrap `text` in an ANSI tint when color output is enabled.
pub fn color(text: &str, tint: Color, use_color: bool) -> String {
    if use_color {
        format!("{}{text}{RESET}", tint.code())
    } else {
        text.to_string()
    }
}

/// Color is on unless the `NO_COLOR` convention says otherwise.
#[must_use]
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_wraps_when_enabled() {
        assert_eq!(color("hi", Color::Red, false), "hi");
        let tinted = color("hi", Color::Red, true);
        assert!(tinted.starts_with("\x1b[31;1m"));
        assert!(tinted.ends_with("\x1b[0m"));
    }
}
