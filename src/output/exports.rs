use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, TimeZone};
use log::info;
use serde::Serialize;

use crate::error::{PipemonError, Result};
use crate::insights::{executions_by_version, UNKNOWN_VERSION};
use crate::model::Pipeline;

const CSV_HEADER: [&str; 6] = [
    "Pipeline Name",
    "Status",
    "Version",
    "Execution Count",
    "Failure Reason",
    "Execution Date",
];

/// One spreadsheet row per pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub name: String,
    pub status: &'static str,
    pub version: String,
    /// Pipelines in the same batch sharing this row's version
    pub execution_count: usize,
    pub failure_reason: String,
    pub executed_at: String,
}

/// Flattens pipelines into export rows, rendering dates in `tz`.
pub fn export_rows<Tz>(pipelines: &[Pipeline], tz: &Tz) -> Vec<ExportRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let counts = executions_by_version(pipelines);

    pipelines
        .iter()
        .map(|pipeline| {
            let version = pipeline
                .version_tag
                .clone()
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
            let failure_reason = pipeline
                .stages
                .iter()
                .find_map(|stage| stage.failure_reason.clone())
                .unwrap_or_default();

            ExportRow {
                name: pipeline.name.clone(),
                status: pipeline.status.capitalized(),
                execution_count: counts.get(&version).copied().unwrap_or(0),
                version,
                failure_reason,
                executed_at: pipeline
                    .started_at
                    .with_timezone(tz)
                    .format("%-m/%-d/%Y, %-I:%M:%S %p")
                    .to_string(),
            }
        })
        .collect()
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("pipelines_{}.csv", date.format("%Y-%m-%d"))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn write_csv(rows: &[ExportRow], output: &mut dyn Write) -> std::io::Result<()> {
    writeln!(output, "{}", CSV_HEADER.join(","))?;

    for row in rows {
        writeln!(
            output,
            "{},{},{},{},{},{}",
            csv_field(&row.name),
            row.status,
            csv_field(&row.version),
            row.execution_count,
            csv_field(&row.failure_reason),
            csv_field(&row.executed_at),
        )?;
    }

    Ok(())
}

/// Writes the batch as `pipelines_{date}.csv` into `dir`.
///
/// # Errors
///
/// Returns `ExportFailed` for an empty batch or when the file cannot be written.
pub fn export_to_dir<Tz>(
    dir: &Path,
    pipelines: &[Pipeline],
    today: NaiveDate,
    tz: &Tz,
) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if pipelines.is_empty() {
        return Err(PipemonError::ExportFailed("no pipelines to export".into()));
    }

    let path = dir.join(export_file_name(today));
    let failed = |e: std::io::Error| PipemonError::ExportFailed(format!("{}: {e}", path.display()));

    let rows = export_rows(pipelines, tz);
    let file = File::create(&path).map_err(failed)?;
    let mut writer = BufWriter::new(file);
    write_csv(&rows, &mut writer).map_err(failed)?;
    writer.flush().map_err(failed)?;

    info!("Exported {} pipelines to {}", rows.len(), path.display());

    Ok(path)
}

pub fn export_json(pipelines: &[Pipeline], pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(pipelines)?
    } else {
        serde_json::to_string(pipelines)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}
