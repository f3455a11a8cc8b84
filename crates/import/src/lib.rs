pub mod credit_card;
pub mod dispatch;
pub mod parser;
pub mod rules;
pub mod ubs_account;
pub(crate) mod util;

pub use credit_card::CreditCardParser;
pub use dispatch::{parse_statement, StatementFormat};
pub use parser::{ParseError, ParsedReport, StatementParser};
pub use rules::CategoryRuleEngine;
pub use ubs_account::UbsAccountParser;
pub use util::normalize_amount;
