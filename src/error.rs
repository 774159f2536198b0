use serde::{Deserialize, Serialize};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure that is reported across the command boundary.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The `$MIS_HOME` directory or its `config.json` could not be created, read or validated.
    Config,
    /// The workbook could not be opened, or a sheet could not be read into a table.
    Ingest,
    /// The request itself cannot be satisfied, e.g. the selected month is not in the sheet.
    Request,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// Tags an error with its `ErrorType` before it leaves a command handler.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(format!("{error_type} error")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_pub_result_adds_error_type() {
        let r: std::result::Result<(), Error> = Err(anyhow!("sheet 'x' not found"));
        let e = r.pub_result(ErrorType::Ingest).unwrap_err();
        assert_eq!(e.to_string(), "ingest error");
        assert_eq!(e.root_cause().to_string(), "sheet 'x' not found");
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Config.to_string(), "config");
        assert_eq!(ErrorType::Request.to_string(), "request");
    }
}
