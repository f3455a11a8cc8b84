use crate::credit_card::CreditCardParser;
use crate::parser::{ParseError, ParsedReport, StatementParser};
use crate::ubs_account::UbsAccountParser;

/// Every supported statement layout, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    UbsAccount,
    CreditCard,
}

impl StatementFormat {
    pub const ALL: [StatementFormat; 2] =
        [StatementFormat::UbsAccount, StatementFormat::CreditCard];

    fn parser(self) -> &'static dyn StatementParser {
        match self {
            StatementFormat::UbsAccount => &UbsAccountParser,
            StatementFormat::CreditCard => &CreditCardParser,
        }
    }

    /// First format whose sniff accepts the file.
    pub fn detect(data: &[u8], filename: &str) -> Option<StatementFormat> {
        let sample = first_non_empty_line(data);
        Self::ALL
            .into_iter()
            .find(|format| format.can_parse(&sample, filename))
    }
}

impl StatementParser for StatementFormat {
    fn name(&self) -> &'static str {
        self.parser().name()
    }

    fn can_parse(&self, sample: &str, filename: &str) -> bool {
        self.parser().can_parse(sample, filename)
    }

    fn parse(&self, data: &[u8]) -> Result<ParsedReport, ParseError> {
        self.parser().parse(data)
    }
}

/// Detects the format and parses the file with it.
pub fn parse_statement(data: &[u8], filename: &str) -> Result<ParsedReport, ParseError> {
    let format = StatementFormat::detect(data, filename).ok_or(ParseError::NoParser)?;
    tracing::debug!(filename, parser = format.name(), "detected statement format");
    format.parse(data)
}

pub fn first_non_empty_line(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}
