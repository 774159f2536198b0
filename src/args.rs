//! These structs provide the CLI interface for the mis CLI.

use crate::commands::OutputFormat;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// mis: A command-line tool for checking monthly MIS workbooks.
///
/// Point it at a catering or vendor MIS workbook, pick a sheet and a month, and it recomputes the
/// buying amount, selling amount and commission of every row, lists the rows where the stored
/// values disagree, lists Karbon expenses, and summarizes the month's totals.
///
/// Sheets are checked by the rule set mapped to their name. Extra sheet names can be mapped in
/// $MIS_HOME/config.json, which is created by the init subcommand.
#[derive(Debug, Parser, Clone)]
#[command(name = "mis", version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and a config.json with default settings.
    ///
    /// This is optional. Without a config file the defaults are used: headers on row 3, exact
    /// comparison of stored and recomputed values, and only the built-in sheet names.
    Init,
    /// List the sheets of a workbook.
    Sheets(SheetsArgs),
    /// List the months found in the month column of a sheet.
    Months(MonthsArgs),
    /// Check one month of a sheet and print the reconciliation report.
    Check(CheckArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber EnvFilter docs.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the mis configuration is held. Defaults to ~/mis
    #[arg(long, env = "MIS_HOME", default_value_t = default_mis_home())]
    mis_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, mis_home: PathBuf) -> Self {
        Self {
            log_level,
            mis_home: mis_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn mis_home(&self) -> &DisplayPath {
        &self.mis_home
    }
}

/// Args for the `mis sheets` command.
#[derive(Debug, Parser, Clone)]
pub struct SheetsArgs {
    /// The workbook: .xlsx, .xlsm, .xlsb, .xls, .ods or .csv
    #[arg(long)]
    file: PathBuf,
}

impl SheetsArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Args for the `mis months` command.
#[derive(Debug, Parser, Clone)]
pub struct MonthsArgs {
    /// The workbook: .xlsx, .xlsm, .xlsb, .xls, .ods or .csv
    #[arg(long)]
    file: PathBuf,

    /// The sheet name, exactly as shown by `mis sheets`.
    #[arg(long)]
    sheet: String,
}

impl MonthsArgs {
    pub fn new(file: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            sheet: sheet.into(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }
}

/// Args for the `mis check` command.
#[derive(Debug, Parser, Clone)]
pub struct CheckArgs {
    /// The workbook: .xlsx, .xlsm, .xlsb, .xls, .ods or .csv
    #[arg(long)]
    file: PathBuf,

    /// The sheet name, exactly as shown by `mis sheets`. It selects the rule set.
    #[arg(long)]
    sheet: String,

    /// The month to check, as shown by `mis months`. Case and surrounding spaces are ignored.
    #[arg(long)]
    month: String,

    /// How to print the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl CheckArgs {
    pub fn new(
        file: impl Into<PathBuf>,
        sheet: impl Into<String>,
        month: impl Into<String>,
        format: OutputFormat,
    ) -> Self {
        Self {
            file: file.into(),
            sheet: sheet.into(),
            month: month.into(),
            format,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

fn default_mis_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("mis"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --mis-home or MIS_HOME instead of relying on the default \
                mis home directory.",
            );
            PathBuf::from("mis")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
