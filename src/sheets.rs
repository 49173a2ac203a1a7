use std::path::Path;

use anyhow::Context;

use crate::weekly_log::WeeklyLog;

/// Reads a CSV file as raw rows. Row 1 stays in the data so row numbers
/// line up with the spreadsheet the file was exported from.
pub fn read_rows(path: &Path) -> anyhow::Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Non-empty values of the first column from row 2 onward.
pub fn read_name_column(path: &Path) -> anyhow::Result<Vec<String>> {
    Ok(read_rows(path)?
        .into_iter()
        .skip(1)
        .filter_map(|row| row.into_iter().next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

/// Staff names from the staff table if it exists and has any, otherwise the
/// configured fallback list.
pub fn read_staff(path: Option<&Path>, fallback: &[String]) -> anyhow::Result<Vec<String>> {
    if let Some(path) = path.filter(|p| p.exists()) {
        let names = read_name_column(path)?;
        if !names.is_empty() {
            return Ok(names);
        }
        tracing::warn!(path = %path.display(), "staff table is empty; using default staff");
    }
    Ok(fallback.to_vec())
}

pub fn read_weekly_log(path: &Path) -> anyhow::Result<WeeklyLog> {
    Ok(WeeklyLog::new(read_rows(path)?))
}

/// Rewrites the log, padding ragged rows to the widest one.
pub fn write_weekly_log(path: &Path, log: &WeeklyLog) -> anyhow::Result<()> {
    let width = log.rows().iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for row in log.rows() {
        let padded = (0..width).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        writer.write_record(padded)?;
    }
    writer.flush()?;
    Ok(())
}
