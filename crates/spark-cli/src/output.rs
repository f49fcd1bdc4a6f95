//! Output formatting: plain text, JSON, and small tables.
//!
//! Values (function returns, variable readings) are rendered in the format
//! selected by `--output`. Listings use `tabled` for the saved-device table.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// `ERROR: ` prefix used for per-update failures.
pub fn error_prefix(color: bool) -> String {
    if color {
        "ERROR: ".red().bold().to_string()
    } else {
        "ERROR: ".into()
    }
}

/// Emphasize a heading line.
pub fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_owned()
    }
}

// ── Renderers ────────────────────────────────────────────────────────

/// Render one value returned by the cloud.
///
/// Plain output prints strings without quotes and everything else as JSON.
pub fn render_value(format: OutputFormat, value: &Value) -> String {
    match format {
        OutputFormat::Plain => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        OutputFormat::Json => render_json(value, false),
        OutputFormat::JsonCompact => render_json(value, true),
    }
}

/// Render a name listing: a heading and one indented name per line, or the
/// `empty` message when there is nothing to list.
pub fn render_names<'a>(
    format: OutputFormat,
    names: impl IntoIterator<Item = &'a str>,
    heading_text: &str,
    empty: &str,
    color: bool,
) -> String {
    let names: Vec<&str> = names.into_iter().collect();
    match format {
        OutputFormat::Plain if names.is_empty() => empty.to_owned(),
        OutputFormat::Plain => {
            let mut lines = vec![heading(heading_text, color)];
            lines.extend(names.iter().map(|n| format!("  {n}")));
            lines.join("\n")
        }
        OutputFormat::Json => render_json(&names, false),
        OutputFormat::JsonCompact => render_json(&names, true),
    }
}

/// Render rows as a rounded table.
pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_default()
}
