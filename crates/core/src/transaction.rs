use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, ReportId, UserId};
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Debit => "debit",
            EntryType::Credit => "credit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(EntryType::Debit),
            "credit" => Ok(EntryType::Credit),
            other => Err(format!("Unknown entry type: '{other}'")),
        }
    }
}

/// How a transaction got its category. A transaction without a category has no source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    Rule,
    Manual,
}

impl CategorySource {
    pub fn as_str(self) -> &'static str {
        match self {
            CategorySource::Rule => "rule",
            CategorySource::Manual => "manual",
        }
    }
}

impl fmt::Display for CategorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(CategorySource::Rule),
            "manual" => Ok(CategorySource::Manual),
            other => Err(format!("Unknown category source: '{other}'")),
        }
    }
}

/// One row as produced by a statement parser, before it is persisted.
///
/// `amount` keeps the normalized decimal text from the source file; its sign
/// already agrees with `entry_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub posted_date: NaiveDate,
    pub description: String,
    pub amount: String,
    pub currency: String,
    pub transaction_id: String,
    pub entry_type: EntryType,
    pub account_number: String,
    pub card_number: Option<String>,
    /// 1-based position among the data rows of the source file.
    pub row: usize,
    pub parser_name: String,
    pub metadata: Option<serde_json::Value>,
}

/// The canonical, persisted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: UserId,
    pub report_id: ReportId,
    pub row: i64,
    pub parser_name: String,
    pub posted_date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub entry_type: EntryType,
    pub account_number: Option<String>,
    pub card_number: Option<String>,
    pub category_id: Option<CategoryId>,
    pub category_source: Option<CategorySource>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

impl Transaction {
    /// Account number if present, otherwise card number.
    pub fn account_key(&self) -> Option<&str> {
        account_key(self.account_number.as_deref(), self.card_number.as_deref())
    }
}

/// First non-blank of account number and card number, trimmed.
pub fn account_key<'a>(account: Option<&'a str>, card: Option<&'a str>) -> Option<&'a str> {
    [account, card]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}
