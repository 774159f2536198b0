//! Excel and OpenDocument workbooks, read with `calamine`.

use crate::model::Value;
use crate::Result;
use anyhow::Context;
use calamine::{open_workbook_auto, CellErrorType, Data, Reader};
use chrono::{Days, NaiveDate};
use std::path::Path;

pub(super) fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)
        .with_context(|| format!("Unable to open the workbook {}", path.display()))?;
    Ok(workbook.sheet_names())
}

/// Reads the cells of `sheet` as rows, starting at the first row and column of the sheet even
/// when the used range begins further down or to the right.
pub(super) fn read_grid(path: &Path, sheet: &str) -> Result<Vec<Vec<Value>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Unable to open the workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Unable to read the sheet '{sheet}'"))?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<Value>> = (0..start_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut cells: Vec<Value> = (0..start_col).map(|_| Value::Empty).collect();
        cells.extend(row.iter().map(cell_value));
        grid.push(cells);
    }
    Ok(grid)
}

/// Converts a calamine cell. Text is kept as text, dates lose their time of day, and error cells
/// other than `#N/A` are kept as their error code.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::text(s.as_str()),
        Data::Float(n) => Value::from_f64(*n),
        Data::Int(n) => Value::number(*n),
        Data::Bool(b) => Value::text(b.to_string()),
        Data::Error(CellErrorType::NA) => Value::Empty,
        Data::Error(e) => Value::text(format!("#{e:?}")),
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(Value::Date)
            .unwrap_or_else(|| Value::from_f64(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .map(Value::Date)
            .unwrap_or_else(|| Value::text(s.as_str())),
        Data::DurationIso(s) => Value::text(s.as_str()),
    }
}

/// Converts an Excel serial date in the 1900 date system. Day 60 is Excel's fictional
/// 29 February 1900, so counting from 30 December 1899 is correct from 1 March 1900 onwards.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::dec;
    use tempfile::TempDir;

    #[test]
    fn test_serial_to_date() {
        assert_eq!(
            serial_to_date(45292.0),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            serial_to_date(45292.75),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(serial_to_date(0.5), None);
        assert_eq!(serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_cell_value() {
        assert_eq!(cell_value(&Data::Empty), Value::Empty);
        assert_eq!(
            cell_value(&Data::String(" Regular ".to_string())),
            Value::text(" Regular ")
        );
        assert_eq!(cell_value(&Data::Float(95.0)), Value::Number(dec("95")));
        assert_eq!(cell_value(&Data::Int(10)), Value::Number(dec("10")));
        assert_eq!(cell_value(&Data::Bool(true)), Value::text("true"));
        assert_eq!(cell_value(&Data::Error(CellErrorType::NA)), Value::Empty);
        assert_eq!(
            cell_value(&Data::Error(CellErrorType::Div0)),
            Value::text("#Div0")
        );
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-01-01T10:00:00".to_string())),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(
            cell_value(&Data::DurationIso("PT1H".to_string())),
            Value::text("PT1H")
        );
    }

    #[test]
    fn test_open_invalid_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "not a zip file").unwrap();
        assert!(sheet_names(&path).is_err());
        assert!(read_grid(&path, "Sheet1").is_err());
    }
}
