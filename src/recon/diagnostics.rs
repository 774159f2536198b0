use serde::Serialize;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Error,
}

serde_plain::derive_display_from_serialize!(Level);

/// One entry of the per-run log.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    level: Level,
    /// The display position of the row this entry is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    row: Option<usize>,
    message: String,
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn row(&self) -> Option<usize> {
        self.row
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The log of a single reconciliation run. It is returned with the results instead of being
/// written anywhere, so a run has no side effects.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, None, message)
    }

    pub fn error(&mut self, row: Option<usize>, message: impl Into<String>) {
        self.push(Level::Error, row, message)
    }

    fn push(&mut self, level: Level, row: Option<usize>, message: impl Into<String>) {
        self.0.push(Diagnostic {
            level,
            row,
            message: message.into(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.level == Level::Error)
    }
}
