//! Output formatting utilities

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use topology_lib::{NodeStatus, Role};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table; `empty` is shown when there are none
pub fn print_table<T: Tabled>(rows: &[T], empty: &str) {
    if rows.is_empty() {
        println!("{}", empty.yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "ready" | "running" | "succeeded" | "active" | "healthy" => status.green().to_string(),
        "pending" | "terminating" | "degraded" => status.yellow().to_string(),
        "notready" | "failed" | "unhealthy" => status.red().to_string(),
        _ => status.dimmed().to_string(),
    }
}

pub fn color_node_status(status: NodeStatus) -> String {
    color_status(status.as_str())
}

pub fn color_role(role: Role) -> String {
    match role {
        Role::Master => role.as_str().magenta().bold().to_string(),
        Role::Worker => role.as_str().cyan().to_string(),
    }
}

/// Ready/total replica count, red when short
pub fn color_replicas(ready: i32, desired: Option<i32>) -> String {
    let desired = desired.unwrap_or(0);
    let text = format!("{}/{}", ready, desired);
    if ready >= desired {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// Compact kubectl-style age such as `5d`, `3h`, `12m` or `40s`
pub fn format_age(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(created) = timestamp.and_then(|t| DateTime::parse_from_rfc3339(t).ok()) else {
        return "<unknown>".to_string();
    };

    let secs = (now - created.with_timezone(&Utc)).num_seconds().max(0);
    match secs {
        s if s >= 86_400 => format!("{}d", s / 86_400),
        s if s >= 3_600 => format!("{}h", s / 3_600),
        s if s >= 60 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}

/// Render an optional value, `-` when absent or empty
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_age_units() {
        assert_eq!(format_age(Some("2024-05-05T12:00:00Z"), now()), "5d");
        assert_eq!(format_age(Some("2024-05-10T09:00:00+00:00"), now()), "3h");
        assert_eq!(format_age(Some("2024-05-10T11:48:00Z"), now()), "12m");
        assert_eq!(format_age(Some("2024-05-10T11:59:20Z"), now()), "40s");
    }

    #[test]
    fn test_format_age_unknown() {
        assert_eq!(format_age(None, now()), "<unknown>");
        assert_eq!(format_age(Some("yesterday"), now()), "<unknown>");
        // Clock skew never yields a negative age
        assert_eq!(format_age(Some("2024-05-10T12:05:00Z"), now()), "0s");
    }

    #[test]
    fn test_color_keeps_text() {
        assert!(color_status("NotReady").contains("NotReady"));
        assert!(color_role(Role::Master).contains("master"));
        assert!(color_replicas(1, Some(3)).contains("1/3"));
        assert!(color_replicas(0, None).contains("0/0"));
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("10.96.0.1")), "10.96.0.1");
    }
}
