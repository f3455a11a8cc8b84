use cashtrack_core::{MoneyError, ParsedTransaction};
use thiserror::Error;

/// Output of a successful parse: every transaction of the file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    pub parser_name: String,
    pub transactions: Vec<ParsedTransaction>,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no parser available")]
    NoParser,
    #[error("read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("read csv header: file has no header line")]
    MissingHeader,
    #[error("parse {field} {value:?} on row {row}: {source}")]
    InvalidDate {
        row: usize,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("parse {field} {value:?} on row {row}: {source}")]
    InvalidAmount {
        row: usize,
        field: &'static str,
        value: String,
        #[source]
        source: MoneyError,
    },
}

/// One supported statement layout.
pub trait StatementParser {
    /// Stable identifier recorded on every transaction this parser produces.
    fn name(&self) -> &'static str;

    /// `sample` is the first non-blank, trimmed line of the file.
    fn can_parse(&self, sample: &str, filename: &str) -> bool;

    /// All-or-nothing: a single malformed row fails the whole file.
    fn parse(&self, data: &[u8]) -> Result<ParsedReport, ParseError>;
}
