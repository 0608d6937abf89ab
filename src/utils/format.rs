//! Table formatting and output utilities
//!
//! This module provides functionality for formatting and displaying
//! tabular data with color support and JSON output.

use crate::error::{NetappDeleterError, Result};
use crossterm::{
    style::{Color as CrosstermColor, Stylize},
    terminal::size,
};
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: CrosstermColor,
    pub success: CrosstermColor,
    pub warning: CrosstermColor,
    pub error: CrosstermColor,
    pub info: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: CrosstermColor::Blue,
            success: CrosstermColor::Green,
            warning: CrosstermColor::Yellow,
            error: CrosstermColor::Red,
            info: CrosstermColor::Cyan,
        }
    }
}

/// Table formatter with color support
pub struct TableFormatter {
    format: OutputFormat,
    no_color: bool,
}

impl TableFormatter {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self { format, no_color }
    }

    /// Render rows in the configured format
    pub fn format_table<T: Tabled + Serialize>(&self, data: &[T]) -> Result<String> {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    return Ok("No data to display".to_string());
                }
                Ok(self.format_as_table(data))
            }
            OutputFormat::Json => serde_json::to_string_pretty(data)
                .map_err(|e| NetappDeleterError::serialization(e.to_string())),
        }
    }

    fn format_as_table<T: Tabled>(&self, data: &[T]) -> String {
        let mut table = Table::new(data);

        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Padding::new(1, 1, 0, 0));

        if !self.no_color {
            table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
        }

        // Auto-adjust width to terminal
        if let Ok((width, _)) = size() {
            table.with(Width::wrap(width as usize));
        }

        table.to_string()
    }
}

/// Display utilities for user-facing messages
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
    to_stderr: bool,
}

impl DisplayUtils {
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
            to_stderr: false,
        }
    }

    /// Send every message to stderr, leaving stdout to structured output
    pub fn with_stderr(mut self, to_stderr: bool) -> Self {
        self.to_stderr = to_stderr;
        self
    }

    /// Print text as-is on the message stream
    pub fn print_plain(&self, text: &str) {
        if self.to_stderr {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    }

    fn styled(&self, prefix: &str, message: &str, color: CrosstermColor) -> String {
        if self.no_color {
            format!("{} {}", prefix, message)
        } else {
            format!("{} {}", prefix, message.with(color))
        }
    }

    /// Print a section header
    pub fn print_header(&self, title: &str) {
        if self.no_color {
            self.print_plain(&format!("=== {} ===", title));
        } else {
            self.print_plain(&format!("=== {} ===", title.with(self.theme.header).bold()));
        }
    }

    pub fn print_success(&self, message: &str) {
        self.print_plain(&self.styled("✓", message, self.theme.success));
    }

    pub fn print_warning(&self, message: &str) {
        self.print_plain(&self.styled("⚠", message, self.theme.warning));
    }

    /// Errors always go to stderr
    pub fn print_error(&self, message: &str) {
        eprintln!("{}", self.styled("✗", message, self.theme.error));
    }

    pub fn print_info(&self, message: &str) {
        self.print_plain(&self.styled("ℹ", message, self.theme.info));
    }

    /// Format key-value pairs
    pub fn format_key_value_pairs(&self, pairs: &[(&str, String)]) -> String {
        let max_key_length = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        pairs
            .iter()
            .map(|(key, value)| {
                let padded = format!("{:width$}", key, width = max_key_length);
                if self.no_color {
                    format!("{}: {}", padded, value)
                } else {
                    format!("{}: {}", padded.with(self.theme.header).bold(), value)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
