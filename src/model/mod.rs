//! Types that represent a sheet of the MIS workbook: cell `Value`s, `Row`s and the `Table`.
pub mod columns;
mod table;
mod value;

pub use table::{Row, Table};
pub use value::Value;
