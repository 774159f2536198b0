//! CSV files, read as a workbook with one sheet.

use crate::model::Value;
use crate::Result;
use anyhow::Context;
use csv::ReaderBuilder;
use std::path::Path;

/// The name of the only sheet in a CSV file: the file name without its extension.
pub(super) fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Reads every record of the file. Records may have different lengths, and cells are typed with
/// `Value::parse`.
pub(super) fn read_grid(path: &Path) -> Result<Vec<Vec<Value>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Unable to open the CSV file {}", path.display()))?;

    let mut grid = Vec::new();
    for (ix, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("Unable to read record {} of {}", ix + 1, path.display())
        })?;
        grid.push(record.iter().map(Value::parse).collect());
    }
    Ok(grid)
}
