use crate::model::columns::{
    AMOUNT, APPROVED_BY, BILL_TO, BUYING_AMT_AI, EXPENSE_COLUMNS, EXPENSE_ITEM, EXPENSE_TYPE,
    KARBON_DATE, MODE_OF_PAYMENT, PAX, PRICE, REASON_FOR_EXPENSE, REQUESTED_BY,
};
use crate::model::{Row, Table, Value};
use crate::recon::RunOptions;
use serde::Serialize;

/// The Karbon expense entry of one row, copied verbatim from the sheet.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct ExpenseRecord {
    pub row: usize,
    pub buying_amount: Value,
    pub date: Value,
    pub expense_item: Value,
    pub reason_for_expense: Value,
    pub expense_type: Value,
    pub price: Value,
    pub pax: Value,
    pub amount: Value,
    pub mode_of_payment: Value,
    pub bill_to: Value,
    pub requested_by: Value,
    pub approved_by: Value,
}

impl ExpenseRecord {
    fn from_row(row: &Row, position: usize) -> Self {
        let cell = |column: &str| row.get(column).clone();
        Self {
            row: position,
            buying_amount: cell(BUYING_AMT_AI),
            date: cell(KARBON_DATE),
            expense_item: cell(EXPENSE_ITEM),
            reason_for_expense: cell(REASON_FOR_EXPENSE),
            expense_type: cell(EXPENSE_TYPE),
            price: cell(PRICE),
            pax: cell(PAX),
            amount: cell(AMOUNT),
            mode_of_payment: cell(MODE_OF_PAYMENT),
            bill_to: cell(BILL_TO),
            requested_by: cell(REQUESTED_BY),
            approved_by: cell(APPROVED_BY),
        }
    }

    /// The expense columns in the order of `EXPENSE_COLUMNS`.
    pub fn expense_values(&self) -> [&Value; 11] {
        [
            &self.date,
            &self.expense_item,
            &self.reason_for_expense,
            &self.expense_type,
            &self.price,
            &self.pax,
            &self.amount,
            &self.mode_of_payment,
            &self.bill_to,
            &self.requested_by,
            &self.approved_by,
        ]
    }
}

/// Returns a record for every row with at least one expense column that is neither blank nor
/// numeric zero. Absent columns count as blank.
pub fn find_karbon_expenses(table: &Table, options: &RunOptions) -> Vec<ExpenseRecord> {
    table
        .rows()
        .iter()
        .filter(|row| has_expense(row))
        .map(|row| ExpenseRecord::from_row(row, options.display_position(row.index())))
        .collect()
}

fn has_expense(row: &Row) -> bool {
    EXPENSE_COLUMNS
        .iter()
        .any(|column| !row.get(column).is_blank_or_zero())
}
