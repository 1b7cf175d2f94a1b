//! Per-user numbering and pricing, observed through the store.

use chrono::NaiveDateTime;
use romi_core::{engine::MetricsEngine, transaction::TransactionRecord};

// ── Helpers ──────────────────────────────────────────────────────────────────

const OFFER: &str = "tenwords_1w_9.99_offer";
const FREE_TRIAL: &str = "tenwords_1w_7.99_7free";
const LIFETIME: &str = "tenwords_lifetime_limited_49.99";

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn txn(user: &str, product: &str, at: &str) -> TransactionRecord {
    TransactionRecord::new(user, product, ts(at), false, Some("US".into()), Some("fb".into()))
}

fn numbers_and_amounts(engine: &MetricsEngine, user: &str) -> Vec<(u32, Option<f64>)> {
    engine
        .store
        .user_history(&engine.run_id, user)
        .unwrap()
        .into_iter()
        .map(|r| (r.transaction_number.unwrap(), r.amount))
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Rows arrive shuffled; numbering follows purchase time per user.
#[test]
fn numbering_matches_manual_chronological_order() {
    let engine = MetricsEngine::build_test("numbering-test".into()).unwrap();
    engine
        .load_transactions(vec![
            txn("alice", OFFER, "2024-01-15 08:00:00"),
            txn("bob", OFFER, "2024-01-02 00:00:00"),
            txn("alice", OFFER, "2024-01-01 10:00:00"),
            txn("alice", OFFER, "2024-01-08 10:00:00"),
        ])
        .unwrap();

    let alice = engine.store.user_history(&engine.run_id, "alice").unwrap();
    let dates: Vec<_> = alice.iter().map(|r| r.purchase_date).collect();
    assert_eq!(
        dates,
        vec![
            ts("2024-01-01 10:00:00"),
            ts("2024-01-08 10:00:00"),
            ts("2024-01-15 08:00:00"),
        ]
    );
    let numbers: Vec<_> = alice.iter().map(|r| r.transaction_number.unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    assert_eq!(numbers_and_amounts(&engine, "bob"), vec![(1, Some(0.5))]);
}

/// Every (product, transaction number) pair gets the catalog price.
#[test]
fn amounts_follow_price_table() {
    let engine = MetricsEngine::build_test("amounts-test".into()).unwrap();
    engine
        .load_transactions(vec![
            txn("trial", FREE_TRIAL, "2024-01-01 00:00:00"),
            txn("trial", FREE_TRIAL, "2024-01-08 00:00:00"),
            txn("offer", OFFER, "2024-01-01 00:00:00"),
            txn("offer", OFFER, "2024-01-08 00:00:00"),
            txn("offer", OFFER, "2024-01-15 00:00:00"),
            txn("life", LIFETIME, "2024-01-01 00:00:00"),
            txn("life", LIFETIME, "2024-06-01 00:00:00"),
        ])
        .unwrap();

    assert_eq!(
        numbers_and_amounts(&engine, "trial"),
        vec![(1, Some(0.0)), (2, Some(7.99))]
    );
    assert_eq!(
        numbers_and_amounts(&engine, "offer"),
        vec![(1, Some(0.5)), (2, Some(9.99)), (3, Some(9.99))]
    );
    assert_eq!(
        numbers_and_amounts(&engine, "life"),
        vec![(1, Some(49.99)), (2, Some(49.99))]
    );
}

/// Numbering spans products: an offer bought after a trial is payment #2.
#[test]
fn numbering_spans_products() {
    let engine = MetricsEngine::build_test("cross-product-test".into()).unwrap();
    engine
        .load_transactions(vec![
            txn("u", OFFER, "2024-01-03 00:00:00"),
            txn("u", FREE_TRIAL, "2024-01-01 00:00:00"),
        ])
        .unwrap();

    let history = engine.store.user_history(&engine.run_id, "u").unwrap();
    assert_eq!(history[0].product_id, FREE_TRIAL);
    assert_eq!(history[0].amount, Some(0.0));
    assert_eq!(history[1].product_id, OFFER);
    assert_eq!(history[1].amount, Some(9.99));
}

/// A product outside the catalog is kept but carries no amount.
#[test]
fn unknown_product_is_stored_without_amount() {
    let engine = MetricsEngine::build_test("unknown-product-test".into()).unwrap();
    engine
        .load_transactions(vec![txn("u", "legacy_monthly", "2024-01-01 00:00:00")])
        .unwrap();

    assert_eq!(numbers_and_amounts(&engine, "u"), vec![(1, None)]);
}
