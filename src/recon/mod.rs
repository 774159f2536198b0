//! The reconciliation engine.
//!
//! A run takes an immutable, month-filtered `Table` and produces a fresh `Reconciliation`:
//! - the pivot of average prices per site/vendor/session/meal/order type
//! - the rows whose stored buying amount, selling amount or commission disagree with a
//!   recomputation from the raw inputs
//! - the rows carrying Karbon (incidental) expense entries
//! - the aggregate summary
//!
//! Nothing here returns an error or logs. Row-level faults are recorded in the run's
//! `Diagnostics`, and the caller decides what to do with them.

mod aggregate;
mod diagnostics;
mod expense;
mod report;
mod validate;

pub use aggregate::{
    calculate_aggregates, pivot_average_prices, AggregateSummary, BucketTotals, OrderBucket,
    PivotKey, PivotRow, EVENT_ORDER_TYPES, REGULAR_ORDER_TYPES,
};
pub use diagnostics::{Diagnostic, Diagnostics, Level};
pub use expense::{find_karbon_expenses, ExpenseRecord};
pub use report::{
    build_report, format_number, format_value, Content, DisplayTable, ReconciliationReport,
    ReportSection, NO_EXPENSES, NO_MISMATCH,
};
pub use validate::{find_mismatches, MismatchRecord, RowFault};

use crate::model::Table;
use rust_decimal::Decimal;
use serde::Serialize;

/// The 1-based sheet row that holds the column headers in an MIS workbook.
pub const DEFAULT_HEADER_ROW: usize = 3;

/// Settings for a single run.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RunOptions {
    header_row: usize,
    tolerance: Decimal,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            header_row: DEFAULT_HEADER_ROW,
            tolerance: Decimal::ZERO,
        }
    }
}

impl RunOptions {
    pub fn new(header_row: usize, tolerance: Decimal) -> Self {
        Self {
            header_row,
            tolerance,
        }
    }

    pub fn header_row(&self) -> usize {
        self.header_row
    }

    /// The largest absolute difference between a stored and a recomputed value that still counts
    /// as a match. Zero means exact equality.
    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// The row number shown to the operator for the row at `index` below the header.
    pub fn display_position(&self, index: usize) -> usize {
        index + self.header_row
    }
}

/// Everything computed by one run, before any formatting.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Reconciliation {
    pivot: Vec<PivotRow>,
    mismatches: Vec<MismatchRecord>,
    expenses: Vec<ExpenseRecord>,
    summary: AggregateSummary,
    diagnostics: Diagnostics,
}

impl Reconciliation {
    pub fn pivot(&self) -> &[PivotRow] {
        &self.pivot
    }

    pub fn mismatches(&self) -> &[MismatchRecord] {
        &self.mismatches
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn summary(&self) -> &AggregateSummary {
        &self.summary
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Runs the validator, the aggregator and the expense extractor over `table`.
pub fn reconcile(table: &Table, options: &RunOptions) -> Reconciliation {
    let mut diagnostics = Diagnostics::new();
    diagnostics.info(format!("Checking {} rows", table.len()));

    let pivot = pivot_average_prices(table, options, &mut diagnostics);
    let mismatches = find_mismatches(table, options, &mut diagnostics);
    let summary = calculate_aggregates(table, options, &mut diagnostics);
    let expenses = find_karbon_expenses(table, options);

    diagnostics.info(format!(
        "Found {} mismatches and {} Karbon expense rows",
        mismatches.len(),
        expenses.len()
    ));

    Reconciliation {
        pivot,
        mismatches,
        expenses,
        summary,
        diagnostics,
    }
}
