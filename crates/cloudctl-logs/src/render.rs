//! Terminal rendering of live log lines

use cloudctl_core::{LogLine, Result};
use colored::{Color, Colorize};
use std::io::Write;

/// Colours handed out to servers by name
const SERVER_PALETTE: &[Color] = &[
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::BrightGreen,
    Color::BrightBlue,
    Color::BrightMagenta,
];

/// Fixed colour of a log type
pub fn log_type_colour(log_type: &str) -> Color {
    match log_type {
        "apache-request" | "drupal-request" => Color::Cyan,
        "bal-request" | "varnish-request" => Color::Blue,
        "drupal-watchdog" => Color::Yellow,
        "mysql-slow" => Color::Magenta,
        t if t.ends_with("-error") => Color::Red,
        _ => Color::White,
    }
}

/// Stable colour of a server name
pub fn server_colour(server: &str) -> Color {
    let hash = server
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    SERVER_PALETTE[hash as usize % SERVER_PALETTE.len()]
}

/// Writes lines to an output sink in the order they are handed over
pub struct LineRenderer<W: Write> {
    out: W,
    colourise: bool,
}

impl<W: Write> LineRenderer<W> {
    pub fn new(out: W, colourise: bool) -> Self {
        Self { out, colourise }
    }

    pub fn colourise(&self) -> bool {
        self.colourise
    }

    /// Format a line as `<server> <log type> <text>`
    pub fn format(&self, line: &LogLine) -> String {
        if self.colourise {
            format!(
                "{} {} {}",
                line.server.color(server_colour(&line.server)),
                line.log_type.color(log_type_colour(&line.log_type)),
                line.text
            )
        } else {
            format!("{} {} {}", line.server, line.log_type, line.text)
        }
    }

    /// Write one line and flush so it shows up immediately
    pub fn render(&mut self, line: &LogLine) -> Result<()> {
        let formatted = self.format(line);
        writeln!(self.out, "{}", formatted)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
