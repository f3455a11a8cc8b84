use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::money::{Money, REPORTING_CURRENCY};

/// Aggregate over a filtered set of transactions, in reporting-currency cents.
///
/// `average_cents` and `median_cents` cover debit (negative) amounts only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub count: usize,
    pub total_cents: i64,
    pub average_cents: i64,
    pub median_cents: i64,
    pub currency: String,
    pub unique_accounts: usize,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
}

impl TransactionSummary {
    pub fn empty() -> Self {
        SummaryAccumulator::default().finish()
    }
}

#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    count: usize,
    total: Decimal,
    debits: Vec<Decimal>,
    accounts: HashSet<String>,
    dates: Option<(NaiveDate, NaiveDate)>,
}

impl SummaryAccumulator {
    /// `amount` must already be expressed in the reporting currency.
    pub fn push(&mut self, amount: Decimal, posted_date: NaiveDate, account_key: Option<&str>) {
        self.count += 1;
        self.total += amount;
        if amount.is_sign_negative() && !amount.is_zero() {
            self.debits.push(amount);
        }
        if let Some(key) = account_key.map(str::trim).filter(|k| !k.is_empty()) {
            self.accounts.insert(key.to_string());
        }
        self.dates = Some(match self.dates {
            None => (posted_date, posted_date),
            Some((min, max)) => (min.min(posted_date), max.max(posted_date)),
        });
    }

    pub fn finish(mut self) -> TransactionSummary {
        self.debits.sort();

        let (average, median) = if self.debits.is_empty() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let n = self.debits.len();
            let sum: Decimal = self.debits.iter().sum();
            let average = sum / Decimal::from(n);
            let middle = n / 2;
            let median = if n % 2 == 0 {
                (self.debits[middle - 1] + self.debits[middle]) / Decimal::TWO
            } else {
                self.debits[middle]
            };
            (average, median)
        };

        TransactionSummary {
            count: self.count,
            total_cents: Money::from_decimal(self.total).to_cents(),
            average_cents: Money::from_decimal(average).to_cents(),
            median_cents: Money::from_decimal(median).to_cents(),
            currency: REPORTING_CURRENCY.to_string(),
            unique_accounts: self.accounts.len(),
            date_range_start: self.dates.map(|(min, _)| min),
            date_range_end: self.dates.map(|(_, max)| max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let summary = TransactionSummary::empty();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_cents, 0);
        assert_eq!(summary.average_cents, 0);
        assert_eq!(summary.median_cents, 0);
        assert_eq!(summary.unique_accounts, 0);
        assert_eq!(summary.currency, "CHF");
        assert_eq!(summary.date_range_start, None);
        assert_eq!(summary.date_range_end, None);
    }

    #[test]
    fn single_debit() {
        let mut acc = SummaryAccumulator::default();
        acc.push(dec!(-5.90), date(2026, 1, 5), Some("0230"));
        let summary = acc.finish();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total_cents, -590);
        assert_eq!(summary.average_cents, -590);
        assert_eq!(summary.median_cents, -590);
        assert_eq!(summary.unique_accounts, 1);
    }

    #[test]
    fn credits_count_toward_total_only() {
        let mut acc = SummaryAccumulator::default();
        acc.push(dec!(-10.00), date(2026, 1, 5), None);
        acc.push(dec!(100.00), date(2026, 1, 6), None);
        acc.push(dec!(-30.00), date(2026, 1, 7), None);
        let summary = acc.finish();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_cents, 6000);
        assert_eq!(summary.average_cents, -2000);
        // even count: mean of the two middle values
        assert_eq!(summary.median_cents, -2000);
    }

    #[test]
    fn median_of_odd_count_is_middle_value() {
        let mut acc = SummaryAccumulator::default();
        for amount in [dec!(-1.00), dec!(-50.00), dec!(-7.00)] {
            acc.push(amount, date(2026, 1, 1), None);
        }
        assert_eq!(acc.finish().median_cents, -700);
    }

    #[test]
    fn date_bounds_and_distinct_accounts() {
        let mut acc = SummaryAccumulator::default();
        acc.push(dec!(-1), date(2026, 2, 10), Some("A"));
        acc.push(dec!(-1), date(2026, 1, 3), Some(" A "));
        acc.push(dec!(-1), date(2026, 3, 1), Some("B"));
        acc.push(dec!(-1), date(2026, 2, 1), None);
        let summary = acc.finish();
        assert_eq!(summary.unique_accounts, 2);
        assert_eq!(summary.date_range_start, Some(date(2026, 1, 3)));
        assert_eq!(summary.date_range_end, Some(date(2026, 3, 1)));
    }

    #[test]
    fn converted_fractions_round_to_cents() {
        let mut acc = SummaryAccumulator::default();
        acc.push(dec!(-10.005), date(2026, 1, 1), None);
        let summary = acc.finish();
        assert_eq!(summary.total_cents, -1001);
    }
}
