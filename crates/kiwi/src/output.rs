//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use kiwi_core::DeviceStatus;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Status text for detail views, green when active.
pub fn status_label(status: DeviceStatus, color: bool) -> String {
    match (status, color) {
        (DeviceStatus::Active, true) => status.green().to_string(),
        (DeviceStatus::Inactive, true) => status.dimmed().to_string(),
        (_, false) => status.to_string(),
    }
}

/// One-line confirmation on stderr, so stdout stays machine-readable.
pub fn success(global: &GlobalOpts, message: &str) {
    if global.quiet {
        return;
    }
    if should_color(global.color) {
        eprintln!("{} {message}", "✓".green().bold());
    } else {
        eprintln!("✓ {message}");
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.expect("serialization should not fail")
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: u32,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: 1, name: "a" }, Item { id: 2, name: "b" }]
    }

    fn list(format: OutputFormat) -> String {
        render_list(format, &items(), |i| Row { id: i.id }, |i| i.id.to_string())
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        assert_eq!(list(OutputFormat::Plain), "1\n2");
    }

    #[test]
    fn compact_json_is_single_line() {
        assert_eq!(
            list(OutputFormat::JsonCompact),
            r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#
        );
    }

    #[test]
    fn table_has_header() {
        let table = list(OutputFormat::Table);
        assert!(table.contains("ID"));
        assert!(table.lines().count() >= 4);
    }

    #[test]
    fn status_label_without_color_is_plain() {
        assert_eq!(status_label(DeviceStatus::Inactive, false), "inactive");
    }
}
