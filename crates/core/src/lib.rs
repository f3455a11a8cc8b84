pub mod filter;
pub mod ids;
pub mod money;
pub mod report;
pub mod rule;
pub mod summary;
pub mod transaction;

pub use filter::TransactionFilter;
pub use ids::{CategoryId, ReportId, UserId};
pub use money::{Money, MoneyError, REPORTING_CURRENCY};
pub use report::{Report, ReportStatus};
pub use rule::{Category, CategoryRule};
pub use summary::{SummaryAccumulator, TransactionSummary};
pub use transaction::{CategorySource, EntryType, ParsedTransaction, Transaction};
