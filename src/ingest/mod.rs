//! Reads MIS sheets from workbooks on disk.
//!
//! Excel and OpenDocument workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read with
//! `calamine`. A `.csv` file is treated as a workbook with a single sheet named after the file.
//! Parsing is blocking, so it runs on tokio's blocking pool.

mod delimited;
mod excel;

use crate::model::{Table, Value};
use crate::Result;
use anyhow::{bail, ensure, Context};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The file formats that can be read.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceKind {
    Excel,
    Csv,
}

impl SourceKind {
    /// Determines the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceKind::Excel),
            "csv" => Ok(SourceKind::Csv),
            _ => bail!(
                "Unsupported file type '{}', expected an Excel workbook or a CSV file",
                path.display()
            ),
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Excel => f.write_str("excel"),
            SourceKind::Csv => f.write_str("csv"),
        }
    }
}

/// A workbook file that sheets can be loaded from.
#[derive(Debug, Clone)]
pub struct Workbook {
    path: PathBuf,
    kind: SourceKind,
}

impl Workbook {
    /// Checks that `path` is a readable file of a supported type. Nothing is parsed yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let kind = SourceKind::from_path(&path)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Unable to open the workbook at {}", path.display()))?;
        ensure!(metadata.is_file(), "'{}' is not a file", path.display());
        debug!("Opened {kind} workbook {}", path.display());
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The sheet names in workbook order.
    pub async fn sheet_names(&self) -> Result<Vec<String>> {
        match self.kind {
            SourceKind::Excel => {
                let path = self.path.clone();
                tokio::task::spawn_blocking(move || excel::sheet_names(&path))
                    .await
                    .context("The workbook reader task failed")?
            }
            SourceKind::Csv => Ok(vec![delimited::sheet_name(&self.path)]),
        }
    }

    /// Loads `sheet` with its column headers at the 1-based row `header_row`.
    pub async fn load_sheet(&self, sheet: &str, header_row: usize) -> Result<Table> {
        let grid = self.read_grid(sheet).await?;
        let table = Table::from_sheet(grid, header_row)
            .with_context(|| format!("Unable to read the sheet '{sheet}'"))?;
        info!(
            "Loaded {} rows and {} columns from the sheet '{sheet}'",
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }

    async fn read_grid(&self, sheet: &str) -> Result<Vec<Vec<Value>>> {
        let path = self.path.clone();
        let sheet = sheet.to_string();
        match self.kind {
            SourceKind::Excel => {
                tokio::task::spawn_blocking(move || excel::read_grid(&path, &sheet))
                    .await
                    .context("The workbook reader task failed")?
            }
            SourceKind::Csv => {
                let name = delimited::sheet_name(&path);
                ensure!(
                    sheet == name,
                    "The sheet '{sheet}' was not found, the only sheet is '{name}'"
                );
                tokio::task::spawn_blocking(move || delimited::read_grid(&path))
                    .await
                    .context("The CSV reader task failed")?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::columns::{BUYING_AMT_AI, EXPENSE_ITEM, MONTH};
    use crate::recon::{reconcile, RunOptions};
    use crate::test::{dec, write_mis_csv, TestHome, MIS_ROWS};

    #[test]
    fn test_source_kind_from_path() {
        assert_eq!(
            SourceKind::from_path(Path::new("June MIS.XLSX")).unwrap(),
            SourceKind::Excel
        );
        assert_eq!(
            SourceKind::from_path(Path::new("mis.ods")).unwrap(),
            SourceKind::Excel
        );
        assert_eq!(
            SourceKind::from_path(Path::new("/tmp/mis.csv")).unwrap(),
            SourceKind::Csv
        );
        assert!(SourceKind::from_path(Path::new("mis.txt")).is_err());
        assert!(SourceKind::from_path(Path::new("mis")).is_err());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let env = TestHome::new();
        assert!(Workbook::open(env.dir().join("missing.csv")).await.is_err());
    }

    #[tokio::test]
    async fn test_csv_sheet_names() {
        let env = TestHome::new();
        let path = write_mis_csv(env.dir(), "Siemens.csv", MIS_ROWS);
        let workbook = Workbook::open(path).await.unwrap();
        assert_eq!(workbook.kind(), SourceKind::Csv);
        assert_eq!(workbook.sheet_names().await.unwrap(), vec!["Siemens"]);
    }

    #[tokio::test]
    async fn test_csv_load_sheet() {
        let env = TestHome::new();
        let path = write_mis_csv(env.dir(), "mis.csv", MIS_ROWS);
        let workbook = Workbook::open(path).await.unwrap();
        let table = workbook.load_sheet("mis", 3).await.unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.has_column(BUYING_AMT_AI));
        let first = &table.rows()[0];
        assert_eq!(first.index(), 0);
        assert_eq!(first.get("date"), &Value::text("01-Jan-2024"));
        assert_eq!(first.get(MONTH), &Value::text("january"));
        assert_eq!(first.get(EXPENSE_ITEM), &Value::text("water cans"));
        assert_eq!(first.number("vendor commission %"), dec("0.1"));
        assert_eq!(table.months().unwrap(), vec!["january", "february"]);
    }

    #[tokio::test]
    async fn test_csv_unknown_sheet() {
        let env = TestHome::new();
        let path = write_mis_csv(env.dir(), "mis.csv", MIS_ROWS);
        let workbook = Workbook::open(path).await.unwrap();
        assert!(workbook.load_sheet("Sheet1", 3).await.is_err());
    }

    #[tokio::test]
    async fn test_csv_wrong_header_row() {
        let env = TestHome::new();
        let path = write_mis_csv(env.dir(), "mis.csv", MIS_ROWS);
        let workbook = Workbook::open(path).await.unwrap();
        // The title row becomes the header, and the data rows are longer than it.
        assert!(workbook.load_sheet("mis", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_csv_load_and_reconcile_month() {
        let env = TestHome::new();
        let path = write_mis_csv(env.dir(), "mis.csv", MIS_ROWS);
        let workbook = Workbook::open(path).await.unwrap();
        let table = workbook.load_sheet("mis", 3).await.unwrap();
        let january = table.filter_month(" JANUARY ").unwrap();
        assert_eq!(january.len(), 2);

        let run = reconcile(&january, &RunOptions::default());
        assert_eq!(run.mismatches().len(), 1);
        let mismatch = &run.mismatches()[0];
        assert_eq!(mismatch.row(), 3);
        assert_eq!(mismatch.column(), BUYING_AMT_AI);
        assert_eq!(mismatch.expected(), dec("90"));
        assert_eq!(run.expenses().len(), 1);
        assert_eq!(run.summary().number_of_days(), 2);
    }
}
