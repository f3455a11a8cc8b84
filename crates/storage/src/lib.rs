pub mod categories;
pub mod db;
pub mod rates;
pub mod reports;
pub mod transactions;

pub use categories::{
    create_category, create_category_rule, delete_category_rule, list_categories,
    list_category_rules, reorder_category_rules,
};
pub use db::{create_db, DbPool};
pub use rates::{get_exchange_rate, upsert_exchange_rate};
pub use reports::{
    get_report, insert_report, list_pending_reports, reset_report, update_report_status,
};
pub use transactions::{
    count_transactions_for_report, delete_transactions_for_report, insert_transaction,
    list_rule_candidates, list_summary_rows, list_transactions, set_manual_category,
    update_transaction_category, NewTransaction, RuleCandidate, SummaryRow,
};
