use crate::args::{MonthsArgs, SheetsArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::ingest::Workbook;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A list of names printed one per line.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Names(Vec<String>);

impl Names {
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Display for Names {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("\n"))
    }
}

/// Lists the sheets of a workbook in workbook order.
pub async fn sheets(args: &SheetsArgs) -> Result<Out<Names>> {
    let workbook = Workbook::open(args.file())
        .await
        .pub_result(ErrorType::Ingest)?;
    let names = workbook
        .sheet_names()
        .await
        .pub_result(ErrorType::Ingest)?;
    Ok(Out::new(
        format!("Found {} sheets in {}", names.len(), args.file().display()),
        Names(names),
    ))
}

/// Lists the distinct values of the month column of a sheet, in the order they first appear.
pub async fn months(config: &Config, args: &MonthsArgs) -> Result<Out<Names>> {
    let workbook = Workbook::open(args.file())
        .await
        .pub_result(ErrorType::Ingest)?;
    let table = workbook
        .load_sheet(args.sheet(), config.header_row())
        .await
        .pub_result(ErrorType::Ingest)?;
    let months = table.months().pub_result(ErrorType::Ingest)?;
    Ok(Out::new(
        format!("Found {} months in the sheet '{}'", months.len(), args.sheet()),
        Names(months),
    ))
}
