//! Turns a `Reconciliation` into display tables.
//!
//! This is the only place where numbers become strings. Every number is rounded to one decimal
//! place here and nowhere earlier.

use crate::model::columns::PIVOT_KEY_COLUMNS;
use crate::model::Value;
use crate::recon::{Diagnostics, Reconciliation};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

pub const NO_MISMATCH: &str = "No mismatch found.";
pub const NO_EXPENSES: &str = "No Karbon expenses found.";

const AVERAGE_PRICES_TITLE: &str = "Average Buying Price and Selling Price";
const MISMATCHES_TITLE: &str = "Mismatched Data";
const EXPENSES_TITLE: &str = "Karbon Expenses";
const SUMMARY_TITLE: &str = "Aggregated Values";

const MISMATCH_COLUMNS: [&str; 5] = ["Row", "Date", "Column", "Expected", "Actual"];
const EXPENSE_COLUMNS: [&str; 13] = [
    "Row",
    "Buying Amount",
    "Date",
    "Expense Item",
    "Reason for Expense",
    "Expense Type",
    "Price",
    "Pax",
    "Amount",
    "Mode Of Payment",
    "Bill to",
    "Requested By",
    "Approved By",
];
const SUMMARY_COLUMNS: [&str; 2] = ["Parameter", "Value"];

/// A rectangular table of display strings.
///
/// Serializes as a sequence of objects, one per row, with keys in column order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DisplayTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DisplayTable {
    fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Serialize for DisplayTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&DisplayRow {
                columns: &self.columns,
                cells: row,
            })?;
        }
        seq.end()
    }
}

struct DisplayRow<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl Serialize for DisplayRow<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// What a report section shows: a table, or a message saying there is nothing to show.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Table(DisplayTable),
    Empty(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReportSection {
    title: String,
    content: Content,
}

impl ReportSection {
    fn table(title: &str, table: DisplayTable) -> Self {
        Self {
            title: title.to_string(),
            content: Content::Table(table),
        }
    }

    /// A table section, or the `empty` message if the table has no rows.
    fn table_or(title: &str, table: DisplayTable, empty: &str) -> Self {
        let content = if table.is_empty() {
            Content::Empty(empty.to_string())
        } else {
            Content::Table(table)
        };
        Self {
            title: title.to_string(),
            content,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &Content {
        &self.content
    }
}

/// The four display tables of a run plus the run's diagnostics.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReconciliationReport {
    average_prices: ReportSection,
    mismatches: ReportSection,
    expenses: ReportSection,
    summary: ReportSection,
    diagnostics: Diagnostics,
}

impl ReconciliationReport {
    pub fn average_prices(&self) -> &ReportSection {
        &self.average_prices
    }

    pub fn mismatches(&self) -> &ReportSection {
        &self.mismatches
    }

    pub fn expenses(&self) -> &ReportSection {
        &self.expenses
    }

    pub fn summary(&self) -> &ReportSection {
        &self.summary
    }

    /// The sections in display order.
    pub fn sections(&self) -> [&ReportSection; 4] {
        [
            &self.average_prices,
            &self.mismatches,
            &self.expenses,
            &self.summary,
        ]
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Rounds half-to-even to one decimal place and always shows that decimal, e.g. `10` -> `10.0`.
pub fn format_number(n: Decimal) -> String {
    let mut rounded = n.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(1);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// Formats numbers with `format_number`; everything else is shown as is.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}

pub fn build_report(reconciliation: &Reconciliation) -> ReconciliationReport {
    ReconciliationReport {
        average_prices: average_prices_section(reconciliation),
        mismatches: mismatches_section(reconciliation),
        expenses: expenses_section(reconciliation),
        summary: summary_section(reconciliation),
        diagnostics: reconciliation.diagnostics().clone(),
    }
}

fn average_prices_section(reconciliation: &Reconciliation) -> ReportSection {
    let mut columns: Vec<&str> = PIVOT_KEY_COLUMNS.to_vec();
    columns.extend(["days", "average_selling_price"]);
    let mut table = DisplayTable::new(columns.as_slice());
    for pivot_row in reconciliation.pivot() {
        let mut cells: Vec<String> = pivot_row
            .key()
            .values()
            .iter()
            .map(|s| s.to_string())
            .collect();
        cells.push(format_number(Decimal::from(pivot_row.days())));
        cells.push(
            pivot_row
                .average_selling_price()
                .map(format_number)
                .unwrap_or_default(),
        );
        table.push(cells);
    }
    ReportSection::table(AVERAGE_PRICES_TITLE, table)
}

fn mismatches_section(reconciliation: &Reconciliation) -> ReportSection {
    let mut table = DisplayTable::new(&MISMATCH_COLUMNS);
    for mismatch in reconciliation.mismatches() {
        table.push(vec![
            format_number(Decimal::from(mismatch.row())),
            format_value(mismatch.date()),
            mismatch.column().to_string(),
            format_number(mismatch.expected()),
            format_value(mismatch.actual()),
        ]);
    }
    ReportSection::table_or(MISMATCHES_TITLE, table, NO_MISMATCH)
}

fn expenses_section(reconciliation: &Reconciliation) -> ReportSection {
    let mut table = DisplayTable::new(&EXPENSE_COLUMNS);
    for expense in reconciliation.expenses() {
        let mut cells = vec![
            format_number(Decimal::from(expense.row)),
            format_value(&expense.buying_amount),
        ];
        cells.extend(expense.expense_values().into_iter().map(format_value));
        table.push(cells);
    }
    ReportSection::table_or(EXPENSES_TITLE, table, NO_EXPENSES)
}

fn summary_section(reconciliation: &Reconciliation) -> ReportSection {
    let mut table = DisplayTable::new(&SUMMARY_COLUMNS);
    for (name, value) in reconciliation.summary().metrics() {
        table.push(vec![name.to_string(), format_number(value)]);
    }
    ReportSection::table(SUMMARY_TITLE, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::recon::{reconcile, RunOptions};
    use crate::test::{dec, example_row, TableBuilder};

    fn table_of(section: &ReportSection) -> &DisplayTable {
        match section.content() {
            Content::Table(table) => table,
            Content::Empty(message) => panic!("expected a table, got '{message}'"),
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(dec("10")), "10.0");
        assert_eq!(format_number(dec("90.00")), "90.0");
        assert_eq!(format_number(dec("1234.56")), "1234.6");
        assert_eq!(format_number(dec("0.25")), "0.2");
        assert_eq!(format_number(dec("0.35")), "0.4");
        assert_eq!(format_number(dec("-2.75")), "-2.8");
        assert_eq!(format_number(dec("-0.04")), "0.0");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::number(95)), "95.0");
        assert_eq!(format_value(&Value::text("upi")), "upi");
        assert_eq!(format_value(&Value::Empty), "");
    }

    #[test]
    fn test_report_for_example_row() {
        let table = TableBuilder::new().row(example_row()).build();
        let report = build_report(&reconcile(&table, &RunOptions::default()));

        let mismatches = table_of(report.mismatches());
        assert_eq!(report.mismatches().title(), "Mismatched Data");
        assert_eq!(mismatches.columns(), &MISMATCH_COLUMNS);
        assert_eq!(
            mismatches.rows(),
            &[vec!["3.0", "01-Jan-2024", "buying amt ai", "90.0", "95.0"]]
        );

        let pivot = table_of(report.average_prices());
        assert_eq!(
            pivot.rows(),
            &[vec![
                "whitefield",
                "fresh bites",
                "lunch",
                "veg",
                "regular",
                "1.0",
                "10.0"
            ]]
        );

        let summary = table_of(report.summary());
        assert_eq!(summary.rows()[0], vec!["Number of Days", "1.0"]);
        assert_eq!(summary.rows()[1], vec!["Buying Amt AI (Regular)", "95.0"]);
        assert_eq!(summary.rows()[5], vec!["Commission", "10.0"]);
    }

    #[test]
    fn test_empty_states() {
        let table = TableBuilder::new()
            .row(example_row().with("buying amt ai", dec("90")))
            .build();
        let report = build_report(&reconcile(&table, &RunOptions::default()));
        assert_eq!(
            report.mismatches().content(),
            &Content::Empty(NO_MISMATCH.to_string())
        );
        assert_eq!(
            report.expenses().content(),
            &Content::Empty(NO_EXPENSES.to_string())
        );
        // the summary is always a table
        assert_eq!(table_of(report.summary()).rows().len(), 7);
    }

    #[test]
    fn test_expense_table_copies_cells() {
        let table = TableBuilder::new()
            .row(
                Row::new(0)
                    .with("buying amt ai", dec("95"))
                    .with("expense item", "water cans")
                    .with("amount", dec("250.5")),
            )
            .build();
        let report = build_report(&reconcile(&table, &RunOptions::default()));
        let expenses = table_of(report.expenses());
        assert_eq!(expenses.columns().len(), 13);
        assert_eq!(
            expenses.rows()[0],
            vec!["3.0", "95.0", "", "water cans", "", "", "", "", "250.5", "", "", "", ""]
        );
    }

    #[test]
    fn test_display_table_serializes_rows_as_ordered_objects() {
        let mut table = DisplayTable::new(&["Row", "Date", "Actual"]);
        table.push(vec!["3".into(), "2024-01-01".into(), "95.0".into()]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"[{"Row":"3","Date":"2024-01-01","Actual":"95.0"}]"#
        );
    }

    #[test]
    fn test_formatting_does_not_touch_computation() {
        let table = TableBuilder::new()
            .row(example_row().with("buying amt ai", dec("89.96")))
            .build();
        let reconciliation = reconcile(&table, &RunOptions::default());
        let report = build_report(&reconciliation);
        // 89.96 displays as 90.0 but is still a mismatch against 90
        assert_eq!(reconciliation.mismatches().len(), 1);
        assert_eq!(
            &table_of(report.mismatches()).rows()[0][3..],
            &["90.0", "90.0"]
        );
    }
}
