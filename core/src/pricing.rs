//! Product price table. Turns (product, transaction number) into money.
//!
//! The export carries no amounts. Every paid row is priced from the
//! configured catalog: a user's first transaction is charged the trial
//! or intro price, every later one the renewal price.

use crate::{
    config::ProductPrice,
    transaction::TransactionRecord,
    types::{ProductId, TransactionNumber},
};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: HashMap<ProductId, ProductPrice>,
}

impl PriceTable {
    pub fn new(products: &[ProductPrice]) -> Self {
        Self {
            prices: products
                .iter()
                .map(|p| (p.product_id.clone(), p.clone()))
                .collect(),
        }
    }

    /// Price of one transaction, or `None` for a product not in the catalog.
    pub fn amount_for(&self, product_id: &str, number: TransactionNumber) -> Option<f64> {
        let price = self.prices.get(product_id)?;
        if number == 1 {
            Some(price.first_payment)
        } else {
            Some(price.renewal)
        }
    }

    /// Fill `amount` on every numbered record.
    ///
    /// Records without a transaction number are left untouched. Returns
    /// the distinct product ids that had no price, so callers can report them.
    pub fn assign_amounts(&self, records: &mut [TransactionRecord]) -> BTreeSet<ProductId> {
        let mut unpriced = BTreeSet::new();
        for record in records.iter_mut() {
            let Some(number) = record.transaction_number else {
                continue;
            };
            record.amount = self.amount_for(&record.product_id, number);
            if record.amount.is_none() {
                unpriced.insert(record.product_id.clone());
            }
        }
        for product_id in &unpriced {
            log::warn!("pricing: product {product_id} is not in the catalog; its rows carry no amount");
        }
        unpriced
    }
}
