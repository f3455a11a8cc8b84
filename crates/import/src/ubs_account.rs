//! UBS account statement export.
//!
//! Layout: a `key:;value` preamble (only `Account number:` is kept), then a
//! header row starting with `Trade date`, then one row per booking.

use cashtrack_core::ParsedTransaction;

use crate::parser::{ParseError, ParsedReport, StatementParser};
use crate::util::{
    checked_amount, is_blank_record, join_non_empty, parse_date, resolve_entry_type,
    semicolon_reader, strip_bom, HeaderIndex,
};

const ACCOUNT_NUMBER_LABEL: &str = "Account number:";
const HEADER_FIRST_COLUMN: &str = "Trade date";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default)]
pub struct UbsAccountParser;

impl StatementParser for UbsAccountParser {
    fn name(&self) -> &'static str {
        "ubs_account_transactions"
    }

    fn can_parse(&self, sample: &str, _filename: &str) -> bool {
        strip_bom(sample.trim()).starts_with(ACCOUNT_NUMBER_LABEL)
    }

    fn parse(&self, data: &[u8]) -> Result<ParsedReport, ParseError> {
        let text = String::from_utf8_lossy(data);
        let mut reader = semicolon_reader(&text);

        let mut account_number = String::new();
        let mut headers: Option<HeaderIndex> = None;
        let mut row = 0usize;
        let mut transactions = Vec::new();

        for result in reader.records() {
            let record = result?;
            if is_blank_record(&record) {
                continue;
            }

            let Some(index) = &headers else {
                let first = strip_bom(record[0].trim()).trim();
                if first.eq_ignore_ascii_case(ACCOUNT_NUMBER_LABEL) && record.len() > 1 {
                    account_number = record[1].trim().to_string();
                } else if first.eq_ignore_ascii_case(HEADER_FIRST_COLUMN) {
                    headers = Some(HeaderIndex::new(&record));
                }
                continue;
            };

            row += 1;
            let posted_raw = index.field(&record, "Booking date");
            let posted_date = parse_date(posted_raw, DATE_FORMAT, row, "booking date")?;

            let Some((entry_type, amount_raw)) = resolve_entry_type(
                index.field(&record, "Debit"),
                index.field(&record, "Credit"),
            ) else {
                continue;
            };
            let amount = checked_amount(amount_raw, entry_type, row, "amount")?;

            let description = join_non_empty(
                &[
                    index.field(&record, "Description1"),
                    index.field(&record, "Description2"),
                    index.field(&record, "Description3"),
                ],
                "; ",
            );

            transactions.push(ParsedTransaction {
                posted_date,
                description,
                amount,
                currency: index.field(&record, "Currency").to_string(),
                transaction_id: index.field(&record, "Transaction no.").to_string(),
                entry_type,
                account_number: account_number.clone(),
                card_number: None,
                row,
                parser_name: self.name().to_string(),
                metadata: None,
            });
        }

        Ok(ParsedReport {
            parser_name: self.name().to_string(),
            transactions,
        })
    }
}
