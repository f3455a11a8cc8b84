//! Credit card statement export.
//!
//! The file may start with an Excel `sep=;` hint. Rows carry no stable
//! identifier, so one is derived from the row content.

use cashtrack_core::{EntryType, ParsedTransaction};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::parser::{ParseError, ParsedReport, StatementParser};
use crate::util::{
    checked_amount, is_blank_record, parse_date, resolve_entry_type, semicolon_reader,
    HeaderIndex,
};

pub const TRANSACTION_ID_PREFIX: &str = "cc-";
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Optional columns copied into the transaction metadata when non-empty.
const METADATA_COLUMNS: &[(&str, &str)] = &[
    ("Account/Cardholder", "cardholder"),
    ("Sector", "sector"),
    ("Amount", "original_amount"),
    ("Original currency", "original_currency"),
    ("Rate", "rate"),
    ("Booked", "booked"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CreditCardParser;

impl StatementParser for CreditCardParser {
    fn name(&self) -> &'static str {
        "credit_card_transactions"
    }

    fn can_parse(&self, sample: &str, _filename: &str) -> bool {
        let trimmed = sample.trim();
        trimmed.starts_with("sep=") || trimmed.starts_with("Account number;")
    }

    fn parse(&self, data: &[u8]) -> Result<ParsedReport, ParseError> {
        let text = String::from_utf8_lossy(data);
        let mut reader = semicolon_reader(&text);
        let mut records = reader.records();

        let mut header = records.next().ok_or(ParseError::MissingHeader)??;
        if header.get(0).is_some_and(|f| f.trim().starts_with("sep=")) {
            header = records.next().ok_or(ParseError::MissingHeader)??;
        }
        let index = HeaderIndex::new(&header);

        let mut row = 0usize;
        let mut transactions = Vec::new();

        for result in records {
            let record = result?;
            if is_blank_record(&record) {
                continue;
            }

            row += 1;
            let purchase_raw = index.field(&record, "Purchase date");
            if purchase_raw.is_empty() {
                continue;
            }
            let posted_date = parse_date(purchase_raw, DATE_FORMAT, row, "purchase date")?;

            let (entry_type, amount_raw) = match resolve_entry_type(
                index.field(&record, "Debit"),
                index.field(&record, "Credit"),
            ) {
                Some(resolved) => resolved,
                None => (EntryType::Debit, index.field(&record, "Amount")),
            };
            let amount = checked_amount(amount_raw, entry_type, row, "amount")?;

            let description = index.field(&record, "Booking text").to_string();
            let account_number = index.field(&record, "Account number").to_string();
            let card_number = index.field(&record, "Card number").to_string();

            let transaction_id = card_transaction_id(
                &account_number,
                &card_number,
                purchase_raw,
                &description,
                &amount,
            );

            let mut metadata = Map::new();
            for (column, key) in METADATA_COLUMNS {
                let value = index.field(&record, column);
                if !value.is_empty() {
                    metadata.insert((*key).to_string(), Value::String(value.to_string()));
                }
            }

            transactions.push(ParsedTransaction {
                posted_date,
                description,
                amount,
                currency: index.field(&record, "Currency").to_string(),
                transaction_id,
                entry_type,
                account_number,
                card_number: (!card_number.is_empty()).then_some(card_number),
                row,
                parser_name: self.name().to_string(),
                metadata: (!metadata.is_empty()).then_some(Value::Object(metadata)),
            });
        }

        Ok(ParsedReport {
            parser_name: self.name().to_string(),
            transactions,
        })
    }
}

/// Deterministic identifier: SHA-256 over the `|`-joined identifying fields.
pub fn card_transaction_id(
    account_number: &str,
    card_number: &str,
    purchase_date: &str,
    description: &str,
    amount: &str,
) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in [account_number, card_number, purchase_date, description, amount]
        .iter()
        .enumerate()
    {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(part.as_bytes());
    }
    format!("{TRANSACTION_ID_PREFIX}{}", hex::encode(hasher.finalize()))
}
