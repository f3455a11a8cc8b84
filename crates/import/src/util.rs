use cashtrack_core::{EntryType, Money};
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::parser::ParseError;

const BOM: char = '\u{feff}';

pub fn strip_bom(value: &str) -> &str {
    value.strip_prefix(BOM).unwrap_or(value)
}

/// Semicolon-delimited reader tolerant of ragged rows.
pub fn semicolon_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

pub fn is_blank_record(record: &csv::StringRecord) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].trim().is_empty())
}

/// Header name (trimmed, case preserved) to column index.
pub struct HeaderIndex(HashMap<String, usize>);

impl HeaderIndex {
    pub fn new(record: &csv::StringRecord) -> Self {
        Self(
            record
                .iter()
                .enumerate()
                .map(|(i, name)| (strip_bom(name.trim()).to_string(), i))
                .collect(),
        )
    }

    /// Trimmed field under `name`, or `""` when the column or cell is missing.
    pub fn field<'r>(&self, record: &'r csv::StringRecord, name: &str) -> &'r str {
        self.0
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .unwrap_or_default()
    }
}

/// Picks debit when present, else credit. `None` when both are blank.
pub fn resolve_entry_type<'a>(debit: &'a str, credit: &'a str) -> Option<(EntryType, &'a str)> {
    let (debit, credit) = (debit.trim(), credit.trim());
    if !debit.is_empty() {
        Some((EntryType::Debit, debit))
    } else if !credit.is_empty() {
        Some((EntryType::Credit, credit))
    } else {
        None
    }
}

/// Canonicalizes a raw amount and forces its sign to agree with `entry_type`.
///
/// Spaces are dropped, a comma is read as the decimal separator only when the
/// value has no period, and a leading `+` is removed.
pub fn normalize_amount(raw: &str, entry_type: EntryType) -> String {
    let mut value = raw.trim().replace(' ', "");
    if value.is_empty() {
        return value;
    }
    if value.contains(',') && !value.contains('.') {
        value = value.replace(',', ".");
    }
    if let Some(rest) = value.strip_prefix('+') {
        value = rest.to_string();
    }
    match entry_type {
        EntryType::Debit if !value.starts_with('-') => format!("-{value}"),
        EntryType::Credit => value.strip_prefix('-').unwrap_or(&value).to_string(),
        EntryType::Debit => value,
    }
}

/// Normalizes and validates; the returned text always parses as [`Money`].
pub fn checked_amount(
    raw: &str,
    entry_type: EntryType,
    row: usize,
    field: &'static str,
) -> Result<String, ParseError> {
    let amount = normalize_amount(raw, entry_type);
    Money::parse(&amount).map_err(|source| ParseError::InvalidAmount {
        row,
        field,
        value: raw.to_string(),
        source,
    })?;
    Ok(amount)
}

pub fn parse_date(
    raw: &str,
    format: &str,
    row: usize,
    field: &'static str,
) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw.trim(), format).map_err(|source| ParseError::InvalidDate {
        row,
        field,
        value: raw.to_string(),
        source,
    })
}

pub fn join_non_empty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
