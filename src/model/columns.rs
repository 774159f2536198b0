//! Normalized (lower-cased, trimmed) names of the MIS sheet columns that the checker reads.

pub const DATE: &str = "date";
pub const MONTH: &str = "month";
pub const SITE_NAME: &str = "site name";
pub const VENDOR: &str = "vendor";
pub const SESSION: &str = "session";
pub const MEAL_TYPE: &str = "meal type";
pub const ORDER_TYPE: &str = "order type";
pub const RATE: &str = "rate";
pub const PAX_SOLD: &str = "pax sold";
pub const SELLING_AMOUNT: &str = "selling amount";
pub const COMMISSION: &str = "commission";
pub const BUYING_AMT_AI: &str = "buying amt ai";
pub const VENDOR_COMMISSION_PCT: &str = "vendor commission %";

// Karbon expense columns.
pub const KARBON_DATE: &str = "date(karbon)";
pub const EXPENSE_ITEM: &str = "expense item";
pub const REASON_FOR_EXPENSE: &str = "reason for expense";
pub const EXPENSE_TYPE: &str = "expense type";
pub const PRICE: &str = "price";
pub const PAX: &str = "pax";
pub const AMOUNT: &str = "amount";
pub const MODE_OF_PAYMENT: &str = "mode of payment";
pub const BILL_TO: &str = "bill to";
pub const REQUESTED_BY: &str = "requested by";
pub const APPROVED_BY: &str = "approved by";

/// The columns that make up a Karbon expense entry, in display order.
pub const EXPENSE_COLUMNS: [&str; 11] = [
    KARBON_DATE,
    EXPENSE_ITEM,
    REASON_FOR_EXPENSE,
    EXPENSE_TYPE,
    PRICE,
    PAX,
    AMOUNT,
    MODE_OF_PAYMENT,
    BILL_TO,
    REQUESTED_BY,
    APPROVED_BY,
];

/// The columns that identify one pivot group.
pub const PIVOT_KEY_COLUMNS: [&str; 5] = [SITE_NAME, VENDOR, SESSION, MEAL_TYPE, ORDER_TYPE];
