//! Output formatting and persistence for pivoted rate tables.
//!
//! Supports a log summary, CSV, and pretty JSON.

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::{debug, info};

use crate::pipeline::types::PivotTable;
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File formats for [`write_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableFormat {
    Csv,
    Json,
}

/// Logs the shape and date span of a table.
pub fn print_summary(label: &str, table: &PivotTable) {
    let bins: Vec<String> = table.bins().iter().map(ToString::to_string).collect();
    info!(
        table = label,
        dates = table.len(),
        first = ?table.dates().first(),
        last = ?table.dates().last(),
        bins = %bins.join(","),
        "Table summary"
    );
}

/// Writes `table` to `path` in the given format, replacing any existing file.
pub fn write_table(path: &Path, table: &PivotTable, format: TableFormat) -> Result<()> {
    let written = match format {
        TableFormat::Csv => write_csv(path, table),
        TableFormat::Json => write_json(path, table),
    };
    written.with_context(|| format!("writing {}", path.display()))
}

/// Writes one row per date: `date,<bin>,<bin>,..`. Missing cells are blank.
pub fn write_csv(path: &Path, table: &PivotTable) -> Result<()> {
    debug!(path = %path.display(), rows = table.len(), "Writing CSV table");

    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header = vec!["date".to_string()];
    header.extend(table.bins().iter().map(ToString::to_string));
    writer.write_record(&header)?;

    for (date, row) in table.dates().iter().zip(table.rows()) {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(
            row.iter()
                .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the table as pretty-printed JSON.
pub fn write_json(path: &Path, table: &PivotTable) -> Result<()> {
    debug!(path = %path.display(), rows = table.len(), "Writing JSON table");

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, table)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
