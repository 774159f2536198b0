use crate::args::CheckArgs;
use crate::commands::{Out, Rendered};
use crate::error::{ErrorType, IntoResult};
use crate::ingest::Workbook;
use crate::recon::{Content, Diagnostics, Level, ReportSection};
use crate::rules::Dispatch;
use crate::{Config, Result};
use anyhow::anyhow;
use tracing::{debug, error, info};

/// Checks one month of a sheet with the rule set mapped to the sheet's name.
///
/// The sheet is loaded with its headers at the configured header row and filtered to the rows
/// whose month matches `args.month()`. A sheet without a rule set is not an error: the output then
/// holds the "no business logic" message instead of a report.
///
/// # Errors
/// - Returns an `Ingest` error if the workbook or sheet cannot be read.
/// - Returns a `Request` error if no rows belong to the requested month.
pub async fn check(config: &Config, args: &CheckArgs) -> Result<Out<Rendered>> {
    let workbook = Workbook::open(args.file())
        .await
        .pub_result(ErrorType::Ingest)?;
    let sheet = workbook
        .load_sheet(args.sheet(), config.header_row())
        .await
        .pub_result(ErrorType::Ingest)?;
    let month = sheet
        .filter_month(args.month())
        .pub_result(ErrorType::Ingest)?;
    if month.is_empty() {
        let available = sheet.months().unwrap_or_default().join(", ");
        return Err(anyhow!(
            "No rows found for the month '{}' in the sheet '{}'. The months found are: {available}",
            args.month(),
            args.sheet()
        ))
        .pub_result(ErrorType::Request);
    }
    debug!(
        "Checking {} of {} rows for the month '{}'",
        month.len(),
        sheet.len(),
        args.month()
    );

    let dispatch = config
        .rules()
        .dispatch(args.sheet(), &month, &config.run_options());
    let message = match &dispatch {
        Dispatch::Applied { rule, report } => {
            log_diagnostics(report.diagnostics());
            format!(
                "Checked {} rows of '{}' for '{}' with the '{rule}' rule set: {} mismatches, {} \
                Karbon expenses",
                month.len(),
                args.sheet(),
                args.month(),
                row_count(report.mismatches()),
                row_count(report.expenses()),
            )
        }
        Dispatch::NoRule { message } => message.clone(),
    };

    let rendered = Rendered::new(&dispatch, args.sheet(), args.month(), args.format())?;
    Ok(Out::new(message, rendered))
}

fn row_count(section: &ReportSection) -> usize {
    match section.content() {
        Content::Table(table) => table.rows().len(),
        Content::Empty(_) => 0,
    }
}

fn log_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        match diagnostic.level() {
            Level::Info => info!("{}", diagnostic.message()),
            Level::Error => error!("{}", diagnostic.message()),
        }
    }
}
