//! Terminal output formatting

use cloudctl_core::LogTypeDescriptor;
use colored::Colorize;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Global flag for JSON output mode
static JSON_MODE: AtomicBool = AtomicBool::new(false);

/// Enable or disable JSON output mode
pub fn set_json_mode(enabled: bool) {
    JSON_MODE.store(enabled, Ordering::SeqCst);
}

/// Check if JSON output mode is enabled
pub fn is_json_mode() -> bool {
    JSON_MODE.load(Ordering::SeqCst)
}

/// Whether stdout is a terminal that can show colours
pub fn stdout_is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

#[derive(Tabled)]
pub struct LogTypeRow {
    #[tabled(rename = "Type")]
    pub log_type: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Available")]
    pub available: String,
}

impl From<&LogTypeDescriptor> for LogTypeRow {
    fn from(descriptor: &LogTypeDescriptor) -> Self {
        LogTypeRow {
            log_type: descriptor.log_type.clone(),
            label: descriptor.label.clone(),
            available: if descriptor.available { "✓" } else { " " }.to_string(),
        }
    }
}

/// Render the log type table
pub fn log_types_table(log_types: &[LogTypeDescriptor]) -> String {
    let rows: Vec<LogTypeRow> = log_types.iter().map(LogTypeRow::from).collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(2)).with(Alignment::center()))
        .to_string()
}

pub fn print_log_types(log_types: &[LogTypeDescriptor]) {
    if is_json_mode() {
        match serde_json::to_string_pretty(log_types) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing to JSON: {}", e),
        }
        return;
    }

    println!("{}", log_types_table(log_types));
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Status line on stderr, keeps stdout clean for the live tail
pub fn print_notice(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message);
}

/// JSON wrapper for generic responses
#[derive(Serialize)]
pub struct ResponseJson<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Print a success message in JSON format if enabled
pub fn print_success_json<T: Serialize>(message: &str, data: Option<T>) {
    if is_json_mode() {
        let response = ResponseJson {
            success: true,
            message: Some(message.to_string()),
            data,
        };
        if let Ok(json) = serde_json::to_string_pretty(&response) {
            println!("{}", json);
        }
    } else {
        print_success(message);
    }
}

/// Print an error message in JSON format if enabled
pub fn print_error_json(message: &str) {
    if is_json_mode() {
        let response: ResponseJson<()> = ResponseJson {
            success: false,
            message: Some(message.to_string()),
            data: None,
        };
        if let Ok(json) = serde_json::to_string_pretty(&response) {
            eprintln!("{}", json);
        }
    } else {
        print_error(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_toggle() {
        set_json_mode(false);
        assert!(!is_json_mode());

        set_json_mode(true);
        assert!(is_json_mode());

        set_json_mode(false);
        assert!(!is_json_mode());
    }

    #[test]
    fn test_log_types_table_markers() {
        let table = log_types_table(&[
            LogTypeDescriptor::new("apache-access", "Apache access", true),
            LogTypeDescriptor::new("php-error", "PHP error", false),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        // top border, header, separator, two rows, bottom border
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("Type"));
        assert!(lines[1].contains("Label"));
        assert!(lines[1].contains("Available"));

        assert!(lines[3].contains("apache-access"));
        assert!(lines[3].contains('✓'));
        assert!(lines[4].contains("php-error"));
        assert!(!lines[4].contains('✓'));
    }

    #[test]
    fn test_row_from_descriptor() {
        let row = LogTypeRow::from(&LogTypeDescriptor::new("php-error", "PHP error", false));
        assert_eq!(row.available, " ");
        let row = LogTypeRow::from(&LogTypeDescriptor::new("php-error", "PHP error", true));
        assert_eq!(row.available, "✓");
    }

    #[test]
    fn test_response_json_skips_empty_fields() {
        let response: ResponseJson<()> = ResponseJson {
            success: false,
            message: None,
            data: None,
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"success":false}"#
        );
    }
}
