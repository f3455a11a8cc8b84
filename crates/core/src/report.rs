use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{ReportId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Processed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processed => "processed",
            ReportStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "processed" => Ok(ReportStatus::Processed),
            "failed" => Ok(ReportStatus::Failed),
            other => Err(format!("Unknown report status: '{other}'")),
        }
    }
}

/// An uploaded statement file and its processing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub filename: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    pub status: ReportStatus,
    /// Error detail for failed reports, a short summary for processed ones.
    pub status_description: Option<String>,
    pub uploaded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_round_trip() {
        for status in [ReportStatus::Pending, ReportStatus::Processed, ReportStatus::Failed] {
            assert_eq!(status.as_str().parse::<ReportStatus>().unwrap(), status);
        }
        assert!("done".parse::<ReportStatus>().is_err());
    }
}
