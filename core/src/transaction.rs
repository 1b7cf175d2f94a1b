//! User subscription transactions and per-user numbering.

use crate::types::{ProductId, TransactionNumber, UserId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row of the transaction export.
///
/// `transaction_number` and `amount` are derived: they stay `None` until
/// `assign_transaction_numbers` and `PriceTable::assign_amounts` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub purchase_date: NaiveDateTime,
    pub refunded: bool,
    pub country_code: Option<String>,
    pub media_source: Option<String>,
    pub transaction_number: Option<TransactionNumber>,
    pub amount: Option<f64>,
}

impl TransactionRecord {
    pub fn new(
        user_id: impl Into<UserId>,
        product_id: impl Into<ProductId>,
        purchase_date: NaiveDateTime,
        refunded: bool,
        country_code: Option<String>,
        media_source: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            purchase_date,
            refunded,
            country_code,
            media_source,
            transaction_number: None,
            amount: None,
        }
    }

    /// Calendar day of the purchase; the ROMI and ARPU grouping key.
    pub fn purchase_day(&self) -> NaiveDate {
        self.purchase_date.date()
    }
}

/// Sort by (user, purchase time) and number each user's transactions 1..n.
///
/// The sort is stable, so two purchases with the same timestamp keep
/// their export order.
pub fn assign_transaction_numbers(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then(a.purchase_date.cmp(&b.purchase_date))
    });

    let mut counter: TransactionNumber = 0;
    for idx in 0..records.len() {
        let same_user = idx > 0 && records[idx - 1].user_id == records[idx].user_id;
        counter = if same_user { counter + 1 } else { 1 };
        records[idx].transaction_number = Some(counter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn txn(user: &str, at: &str) -> TransactionRecord {
        TransactionRecord::new(user, "p", ts(at), false, None, None)
    }

    #[test]
    fn numbers_follow_purchase_order_per_user() {
        let mut rows = vec![
            txn("b", "2024-01-03 00:00:00"),
            txn("a", "2024-01-02 12:00:00"),
            txn("b", "2024-01-01 00:00:00"),
            txn("a", "2024-01-01 09:00:00"),
            txn("a", "2024-01-09 09:00:00"),
        ];

        assign_transaction_numbers(&mut rows);

        let got: Vec<(&str, u32)> = rows
            .iter()
            .map(|r| (r.user_id.as_str(), r.transaction_number.unwrap()))
            .collect();
        assert_eq!(got, vec![("a", 1), ("a", 2), ("a", 3), ("b", 1), ("b", 2)]);
        assert_eq!(rows[0].purchase_date, ts("2024-01-01 09:00:00"));
        assert_eq!(rows[3].purchase_date, ts("2024-01-01 00:00:00"));
    }

    #[test]
    fn identical_timestamps_keep_input_order() {
        let mut first = txn("u", "2024-02-01 10:00:00");
        first.product_id = "first".into();
        let mut second = txn("u", "2024-02-01 10:00:00");
        second.product_id = "second".into();
        let mut rows = vec![first, second];

        assign_transaction_numbers(&mut rows);

        assert_eq!(rows[0].product_id, "first");
        assert_eq!(rows[0].transaction_number, Some(1));
        assert_eq!(rows[1].transaction_number, Some(2));
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut rows: Vec<TransactionRecord> = Vec::new();
        assign_transaction_numbers(&mut rows);
        assert!(rows.is_empty());
    }
}
