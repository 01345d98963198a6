//! Console writer: stdout/stderr split by level, optional colors

use crate::core::{Level, Result, Writer};
use colored::{Color, Colorize};
use std::io::{self, Write};

pub struct ConsoleWriter {
    use_colors: bool,
    stderr_at: Level,
}

impl ConsoleWriter {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            stderr_at: Level::ERROR,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Send records at or above `level` to stderr instead of stdout
    #[must_use]
    pub fn with_stderr_at(mut self, level: Level) -> Self {
        self.stderr_at = level;
        self
    }

    fn render(&self, level: Level, data: &[u8]) -> Vec<u8> {
        let text = String::from_utf8_lossy(data);
        let (body, newline) = match text.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (&*text, ""),
        };
        format!("{}{}", body.color(level_color(level)), newline).into_bytes()
    }
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Color of a level, by priority band
pub fn level_color(level: Level) -> Color {
    match level.priority() {
        p if p < Level::DEBUG.priority() => Color::BrightBlack,
        p if p < Level::INFO.priority() => Color::Blue,
        p if p < Level::WARN.priority() => Color::Green,
        p if p < Level::ERROR.priority() => Color::Yellow,
        p if p < Level::PANIC.priority() => Color::Red,
        _ => Color::BrightRed,
    }
}

impl Writer for ConsoleWriter {
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        let rendered;
        let out = if self.use_colors {
            rendered = self.render(level, data);
            &rendered[..]
        } else {
            data
        };

        // Locking the stream keeps each record contiguous
        if level >= self.stderr_at {
            io::stderr().lock().write_all(out)?;
        } else {
            io::stdout().lock().write_all(out)?;
        }
        Ok(data.len())
    }

    fn flush(&self) -> Result<()> {
        io::stdout().flush()?;
        io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ConsoleWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_colors() {
        assert_eq!(level_color(Level::TRACE), Color::BrightBlack);
        assert_eq!(level_color(Level::INFO), Color::Green);
        assert_eq!(level_color(Level::new("NOTICE", 250)), Color::Green);
        assert_eq!(level_color(Level::ERROR), Color::Red);
        assert_eq!(level_color(Level::FATAL), Color::BrightRed);
    }

    #[test]
    fn test_render_keeps_newline_outside_color() {
        colored::control::set_override(true);
        let rendered = ConsoleWriter::new().render(Level::WARN, b"lvl=WARN msg=x\n");
        let rendered = String::from_utf8(rendered).unwrap();
        assert!(rendered.contains("lvl=WARN msg=x"));
        assert!(rendered.ends_with("\u{1b}[0m\n"));
    }

    #[test]
    fn test_write_reports_input_length() {
        let writer = ConsoleWriter::with_colors(false);
        assert_eq!(writer.write(Level::DEBUG, b"console test\n").unwrap(), 13);
    }
}
