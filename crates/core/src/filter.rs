use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ReportId};
use super::transaction::EntryType;

pub const DEFAULT_LIST_LIMIT: u32 = 500;

/// Selection shared by transaction listing and summaries. Every field is
/// optional; `None` (or blank text) means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower bound on the posted date.
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound on the posted date.
    pub to_date: Option<NaiveDate>,
    pub report_id: Option<ReportId>,
    pub entry_type: Option<EntryType>,
    /// Case-insensitive substring of the description.
    pub search_text: Option<String>,
    pub account_number: Option<String>,
    pub card_number: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Listing only; summaries always cover the whole selection.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl TransactionFilter {
    pub fn for_report(report_id: ReportId) -> Self {
        Self {
            report_id: Some(report_id),
            ..Self::default()
        }
    }

    pub fn effective_limit(&self) -> u32 {
        match self.limit {
            Some(0) | None => DEFAULT_LIST_LIMIT,
            Some(n) => n,
        }
    }

    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// Returns the trimmed text, or `None` when it is blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
