//! Prints a dispatched report as markdown-style tables, JSON or CSV.

use crate::commands::OutputFormat;
use crate::recon::{Content, DisplayTable, ReconciliationReport};
use crate::rules::Dispatch;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::{Debug, Display, Formatter};

/// A report in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rendered {
    /// One JSON document with the sheet, the month and the outcome of the rule set.
    Json(serde_json::Value),
    /// Markdown tables as a single formatted string.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
}

impl Debug for Rendered {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rendered::Json(v) => write!(f, "Rendered::Json({:?})", v),
            Rendered::Table(s) => write!(f, "Rendered::Table({} chars)", s.len()),
            Rendered::Csv(s) => write!(f, "Rendered::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rendered {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rendered::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rendered::Table(s) => write!(f, "{}", s),
            Rendered::Csv(s) => write!(f, "{}", s),
        }
    }
}

impl Rendered {
    pub(super) fn new(
        dispatch: &Dispatch,
        sheet: &str,
        month: &str,
        format: OutputFormat,
    ) -> Result<Self> {
        Ok(match format {
            OutputFormat::Json => {
                let value = json!({
                    "sheet": sheet,
                    "month": month,
                    "result": dispatch,
                });
                Rendered::Json(value)
            }
            OutputFormat::Table => Rendered::Table(markdown(dispatch, sheet, month)),
            OutputFormat::Csv => Rendered::Csv(csv_text(dispatch)?),
        })
    }
}

fn markdown(dispatch: &Dispatch, sheet: &str, month: &str) -> String {
    let mut out = format!("# {sheet}: {month}\n");
    match dispatch {
        Dispatch::NoRule { message } => {
            out.push('\n');
            out.push_str(message);
            out.push('\n');
        }
        Dispatch::Applied { report, .. } => {
            for section in report.sections() {
                out.push_str(&format!("\n## {}\n\n", section.title()));
                match section.content() {
                    Content::Table(table) => markdown_table(&mut out, table),
                    Content::Empty(message) => {
                        out.push_str(message);
                        out.push('\n');
                    }
                }
            }
        }
    }
    out
}

fn markdown_table(out: &mut String, table: &DisplayTable) {
    out.push_str(&markdown_line(table.columns().iter().map(|c| escape(c))));
    out.push_str(&markdown_line(table.columns().iter().map(|_| "---".to_string())));
    for row in table.rows() {
        out.push_str(&markdown_line(row.iter().map(|c| escape(c))));
    }
}

fn markdown_line(cells: impl Iterator<Item = String>) -> String {
    format!("| {} |\n", cells.collect::<Vec<_>>().join(" | "))
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}

fn csv_text(dispatch: &Dispatch) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    match dispatch {
        Dispatch::NoRule { message } => writer.write_record([message])?,
        Dispatch::Applied { report, .. } => write_report(&mut writer, report)?,
    }
    let bytes = writer
        .into_inner()
        .context("Unable to finish writing the CSV output")?;
    String::from_utf8(bytes).context("The CSV output is not valid UTF-8")
}

fn write_report(
    writer: &mut csv::Writer<Vec<u8>>,
    report: &ReconciliationReport,
) -> Result<()> {
    for section in report.sections() {
        writer.write_record([section.title()])?;
        match section.content() {
            Content::Table(table) => {
                writer.write_record(table.columns())?;
                for row in table.rows() {
                    writer.write_record(row)?;
                }
            }
            Content::Empty(message) => writer.write_record([message])?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recon::RunOptions;
    use crate::rules::{RuleRegistry, NO_RULE};
    use crate::test::{example_row, TableBuilder};

    fn applied() -> Dispatch {
        let table = TableBuilder::new().row(example_row()).build();
        RuleRegistry::default().dispatch("Micochip Juice Junction", &table, &RunOptions::default())
    }

    fn render(format: OutputFormat) -> Rendered {
        Rendered::new(&applied(), "Micochip Juice Junction", "january", format).unwrap()
    }

    fn no_rule() -> Dispatch {
        Dispatch::NoRule {
            message: NO_RULE.to_string(),
        }
    }

    #[test]
    fn test_markdown() {
        let rendered = render(OutputFormat::Table);
        let text = rendered.to_string();
        assert!(text.starts_with("# Micochip Juice Junction: january\n"));
        assert!(text.contains(
            "## Mismatched Data\n\n| Row | Date | Column | Expected | Actual |\n"
        ));
        assert!(text.contains("| 3.0 | 01-Jan-2024 | buying amt ai | 90.0 | 95.0 |\n"));
        assert!(text.contains("## Karbon Expenses\n\nNo Karbon expenses found.\n"));
        assert!(text.contains("| Number of Days | 1.0 |\n"));
    }

    #[test]
    fn test_markdown_no_rule() {
        let rendered = Rendered::new(&no_rule(), "Sheet1", "june", OutputFormat::Table).unwrap();
        assert_eq!(rendered.to_string(), format!("# Sheet1: june\n\n{NO_RULE}\n"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a|b"), "a\\|b");
    }

    #[test]
    fn test_json() {
        let rendered = render(OutputFormat::Json);
        let Rendered::Json(value) = rendered else {
            panic!("expected json");
        };
        assert_eq!(value["sheet"], "Micochip Juice Junction");
        assert_eq!(value["result"]["outcome"], "applied");
        assert_eq!(value["result"]["rule"], "vendor_commission");
        let mismatches = &value["result"]["report"]["mismatches"];
        assert_eq!(mismatches["title"], "Mismatched Data");
        assert_eq!(mismatches["content"]["table"][0]["Column"], "buying amt ai");
        assert_eq!(mismatches["content"]["table"][0]["Expected"], "90.0");
        assert_eq!(
            value["result"]["report"]["expenses"]["content"]["empty"],
            "No Karbon expenses found."
        );
    }

    #[test]
    fn test_json_no_rule() {
        let rendered = Rendered::new(&no_rule(), "Sheet1", "june", OutputFormat::Json).unwrap();
        let Rendered::Json(value) = rendered else {
            panic!("expected json");
        };
        assert_eq!(value["result"]["outcome"], "no_rule");
        assert_eq!(value["result"]["message"], NO_RULE);
    }

    #[test]
    fn test_csv() {
        let rendered = render(OutputFormat::Csv);
        let text = rendered.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Average Buying Price and Selling Price");
        assert!(lines.contains(&"Mismatched Data"));
        assert!(lines.contains(&"Row,Date,Column,Expected,Actual"));
        assert!(lines.contains(&"3.0,01-Jan-2024,buying amt ai,90.0,95.0"));
        assert!(lines.contains(&"No Karbon expenses found."));
        assert!(lines.contains(&"Parameter,Value"));
    }
}
