//! Chooses the rule set that checks a sheet.
//!
//! Every MIS sheet layout is checked by a rule set: a function from a month of the sheet to a
//! `ReconciliationReport`. Sheets are matched to rule sets by their exact, case-sensitive name.
//! The built-in table below can be extended through the `sheets` map of `config.json`.

use crate::model::Table;
use crate::recon::{build_report, reconcile, ReconciliationReport, RunOptions};
use serde::Serialize;
use std::collections::BTreeMap;

/// A rule set.
pub type RuleFn = fn(&Table, &RunOptions) -> ReconciliationReport;

/// Checks buying amount, selling amount and vendor commission, and reports Karbon expenses.
pub const VENDOR_COMMISSION: &str = "vendor_commission";

pub const NO_RULE: &str = "No business logic defined for this sheet.";

const SHEET_RULES: &[(&str, &str)] = &[("Micochip Juice Junction", VENDOR_COMMISSION)];

/// The `vendor_commission` rule set.
pub fn vendor_commission(table: &Table, options: &RunOptions) -> ReconciliationReport {
    build_report(&reconcile(table, options))
}

/// The outcome of dispatching a sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Dispatch {
    Applied {
        rule: String,
        report: ReconciliationReport,
    },
    /// No rule set applies to the sheet. This is not an error.
    NoRule { message: String },
}

#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: BTreeMap<String, RuleFn>,
    sheets: BTreeMap<String, String>,
}

impl Default for RuleRegistry {
    /// The built-in rule sets and sheet names.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(VENDOR_COMMISSION, vendor_commission);
        for (sheet, rule) in SHEET_RULES {
            registry.map_sheet(*sheet, *rule);
        }
        registry
    }
}

impl RuleRegistry {
    /// A registry with no rule sets and no sheets.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
            sheets: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, id: impl Into<String>, rule: RuleFn) {
        let _ = self.rules.insert(id.into(), rule);
    }

    /// Maps `sheet` to the rule set `rule`, replacing any earlier mapping for that sheet.
    pub fn map_sheet(&mut self, sheet: impl Into<String>, rule: impl Into<String>) {
        let _ = self.sheets.insert(sheet.into(), rule.into());
    }

    /// Builder-style `map_sheet` for many sheets.
    pub fn with_sheets<I, S1, S2>(mut self, sheets: I) -> Self
    where
        I: IntoIterator<Item = (S1, S2)>,
        S1: Into<String>,
        S2: Into<String>,
    {
        for (sheet, rule) in sheets {
            self.map_sheet(sheet, rule);
        }
        self
    }

    /// The rule set identifier mapped to `sheet`, whether or not that rule set exists.
    pub fn rule_for_sheet(&self, sheet: &str) -> Option<&str> {
        self.sheets.get(sheet).map(String::as_str)
    }

    /// Runs the rule set for `sheet` over `table`.
    pub fn dispatch(&self, sheet: &str, table: &Table, options: &RunOptions) -> Dispatch {
        let Some(id) = self.sheets.get(sheet) else {
            return Dispatch::NoRule {
                message: NO_RULE.to_string(),
            };
        };
        match self.rules.get(id) {
            Some(rule) => Dispatch::Applied {
                rule: id.clone(),
                report: rule(table, options),
            },
            None => Dispatch::NoRule {
                message: format!("{NO_RULE} The rule set '{id}' is not known."),
            },
        }
    }
}
