use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::models::CleanedTable;

/// Write the table as CSV to `path`, creating parent directories as needed
pub fn write_csv(table: &CleanedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(table, file).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Serialize the table: header row, then one record per year
pub fn write_table<W: Write>(table: &CleanedTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.headers())?;

    for row in 0..table.row_count() {
        csv_writer.write_record(row_fields(table, row))?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn row_fields(table: &CleanedTable, row: usize) -> Vec<String> {
    let mut fields = Vec::with_capacity(table.columns.len() + 2);
    fields.push(table.years[row].to_string());
    fields.extend(table.columns.iter().map(|c| format_number(c.values[row])));
    if let Some(flags) = &table.imputed_flags {
        fields.push(if flags[row] { "True" } else { "False" }.to_string());
    }
    fields
}

/// Shortest round-trip form; integral values keep their `.0`
pub fn format_number(value: Option<f64>) -> String {
    value.map(|v| format!("{:?}", v)).unwrap_or_default()
}

/// Aligned text rendering of the first `rows` rows
pub fn render_preview(table: &CleanedTable, rows: usize) -> String {
    let headers = table.headers();
    let body: Vec<Vec<String>> = (0..table.row_count().min(rows))
        .map(|row| row_fields(table, row))
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| body.iter().map(|r| r[i].len()).fold(h.len(), usize::max))
        .collect();

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:>width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = vec![render(&headers)];
    lines.extend(body.iter().map(|r| render(r)));
    lines.join("\n")
}

pub fn preview(table: &CleanedTable, rows: usize) {
    if rows == 0 {
        return;
    }
    info!(
        "📋 Preview ({} of {} rows):\n{}",
        rows.min(table.row_count()),
        table.row_count(),
        render_preview(table, rows)
    );
}
