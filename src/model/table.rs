use crate::model::columns::{DATE, MONTH};
use crate::model::Value;
use crate::Result;
use anyhow::{bail, ensure};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

static EMPTY: Value = Value::Empty;

/// A single row of a sheet body, keyed by normalized column name.
///
/// `index` is the 0-based position of the row below the header in the unfiltered sheet. It is kept
/// through month filtering so that reported row numbers point back into the workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    index: usize,
    cells: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            cells: BTreeMap::new(),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let _ = self.cells.insert(column.into(), value.into());
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the cell for `column`, or `Value::Empty` if the row has no such column.
    pub fn get(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    /// Returns the cell for `column` only if the column exists for this row.
    pub fn try_get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Shorthand for `self.get(column).numeric_or_zero()`.
    pub fn number(&self, column: &str) -> Decimal {
        self.get(column).numeric_or_zero()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// An in-memory sheet: normalized column names plus the rows below the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table from the raw cells of a sheet.
    ///
    /// `header_row` is the 1-based sheet row holding the column names; rows above it are
    /// discarded. Column names are lower-cased and trimmed, blank names become `unnamed: N` and
    /// repeated names get a `.1`, `.2`, ... suffix. Text in every column except `date` is
    /// lower-cased and trimmed.
    pub fn from_sheet<R>(grid: impl IntoIterator<Item = R>, header_row: usize) -> Result<Self>
    where
        R: IntoIterator<Item = Value>,
    {
        ensure!(header_row >= 1, "The header row is 1-based, got {header_row}");
        let mut sheet_rows = grid.into_iter().skip(header_row - 1);
        let columns = match sheet_rows.next() {
            Some(header) => normalize_headers(header),
            None => bail!("The sheet has no header row at row {header_row}"),
        };

        let mut rows = Vec::new();
        for (ix, cells) in sheet_rows.enumerate() {
            let mut row = Row::new(ix);
            let mut cells = cells.into_iter();
            for column in &columns {
                let value = cells.next().unwrap_or_default();
                let value = if column == DATE {
                    value
                } else {
                    value.normalized()
                };
                row.set(column.clone(), value);
            }
            if cells.any(|extra| !extra.normalized().is_empty()) {
                bail!(
                    "A row longer than the headers list was encountered at row {}",
                    header_row + ix + 1
                );
            }
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the rows whose `month` cell matches `month`, compared as trimmed, lower-cased text.
    pub fn filter_month(&self, month: &str) -> Result<Table> {
        ensure!(
            self.has_column(MONTH),
            "The sheet has no '{MONTH}' column to filter by"
        );
        let wanted = month.trim().to_lowercase();
        let rows = self
            .rows
            .iter()
            .filter(|row| month_key(row.get(MONTH)) == wanted)
            .cloned()
            .collect();
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// The distinct, non-blank values of the `month` column in the order they first appear.
    pub fn months(&self) -> Result<Vec<String>> {
        ensure!(self.has_column(MONTH), "The sheet has no '{MONTH}' column");
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .map(|row| month_key(row.get(MONTH)))
            .filter(|key| !key.is_empty() && seen.insert(key.clone()))
            .collect())
    }
}

fn month_key(value: &Value) -> String {
    value.to_string().trim().to_lowercase()
}

fn normalize_headers(header: impl IntoIterator<Item = Value>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .into_iter()
        .enumerate()
        .map(|(ix, value)| {
            let base = value.to_string().trim().to_lowercase();
            let base = if base.is_empty() {
                format!("unnamed: {ix}")
            } else {
                base
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}
