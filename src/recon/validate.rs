use crate::model::columns::{
    BUYING_AMT_AI, COMMISSION, DATE, PAX_SOLD, RATE, SELLING_AMOUNT, VENDOR_COMMISSION_PCT,
};
use crate::model::{Row, Table, Value};
use crate::recon::{Diagnostics, RunOptions};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A stored value that disagrees with the value recomputed from the row's inputs.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct MismatchRecord {
    /// Display position of the row, see `RunOptions::display_position`.
    row: usize,
    date: Value,
    column: String,
    expected: Decimal,
    /// The stored cell. A blank cell is reported as `0`.
    actual: Value,
}

impl MismatchRecord {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn date(&self) -> &Value {
        &self.date
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn expected(&self) -> Decimal {
        self.expected
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }
}

/// The reason a row could not be fully checked or totalled.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RowFault {
    /// A column needed to report a mismatch does not exist in the sheet.
    MissingColumn(&'static str),
    /// Recomputing the named column overflowed.
    Overflow(&'static str),
    /// Adding the row to the running total of the named column overflowed.
    TotalOverflow(&'static str),
}

impl Display for RowFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RowFault::MissingColumn(column) => write!(f, "the sheet has no '{column}' column"),
            RowFault::Overflow(column) => {
                write!(f, "the expected '{column}' is too large to compute")
            }
            RowFault::TotalOverflow(column) => {
                write!(f, "the '{column}' total is too large to compute")
            }
        }
    }
}

impl std::error::Error for RowFault {}

/// Recomputes the buying amount, selling amount and commission of every row and reports each
/// stored value that differs:
///
/// - `buying amt ai` should be `selling amount - commission`
/// - `selling amount` should be `pax sold * rate`
/// - `commission` should be `selling amount * vendor commission %`
///
/// The workbook computed its stored values in binary floating point, so recomputation uses `f64`
/// as well: a stored value matches when it is the same double the formula yields. Blank and
/// non-numeric operands count as zero. A row that faults is abandoned at the fault, keeping any
/// mismatch already found for it, and an error is added to `diagnostics`.
pub fn find_mismatches(
    table: &Table,
    options: &RunOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<MismatchRecord> {
    let tolerance = options.tolerance().to_f64().unwrap_or(0.0);
    let mut mismatches = Vec::new();
    for row in table.rows() {
        let position = options.display_position(row.index());
        if let Err(fault) = check_row(row, position, tolerance, &mut mismatches) {
            diagnostics.error(
                Some(position),
                format!("Error processing row {position}: {fault}"),
            );
        }
    }
    mismatches
}

fn operand(row: &Row, column: &str) -> f64 {
    row.get(column).as_f64().unwrap_or(0.0)
}

fn check_row(
    row: &Row,
    position: usize,
    tolerance: f64,
    out: &mut Vec<MismatchRecord>,
) -> Result<(), RowFault> {
    let selling_amount = operand(row, SELLING_AMOUNT);
    let commission = operand(row, COMMISSION);

    let expected = selling_amount - commission;
    check_field(row, position, BUYING_AMT_AI, expected, tolerance, out)?;

    let expected = operand(row, PAX_SOLD) * operand(row, RATE);
    check_field(row, position, SELLING_AMOUNT, expected, tolerance, out)?;

    let expected = selling_amount * operand(row, VENDOR_COMMISSION_PCT);
    check_field(row, position, COMMISSION, expected, tolerance, out)
}

fn check_field(
    row: &Row,
    position: usize,
    column: &'static str,
    expected: f64,
    tolerance: f64,
    out: &mut Vec<MismatchRecord>,
) -> Result<(), RowFault> {
    let actual = match row.get(column) {
        Value::Empty => Value::Number(Decimal::ZERO),
        stored => stored.clone(),
    };
    if agrees(expected, &actual, tolerance) {
        return Ok(());
    }
    let expected = Value::from_f64(expected)
        .as_number()
        .ok_or(RowFault::Overflow(column))?;
    let date = row
        .try_get(DATE)
        .ok_or(RowFault::MissingColumn(DATE))?
        .clone();
    out.push(MismatchRecord {
        row: position,
        date,
        column: column.to_string(),
        expected,
        actual,
    });
    Ok(())
}

fn agrees(expected: f64, actual: &Value, tolerance: f64) -> bool {
    let Some(actual) = actual.as_f64() else {
        return false;
    };
    if tolerance == 0.0 {
        return expected == actual;
    }
    (expected - actual).abs() <= tolerance
}
