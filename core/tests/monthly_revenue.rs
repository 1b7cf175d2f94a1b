//! Revenue and paying users per calendar month.

use chrono::NaiveDateTime;
use romi_core::{engine::MetricsEngine, transaction::TransactionRecord};

// ── Helpers ──────────────────────────────────────────────────────────────────

const OFFER: &str = "tenwords_1w_9.99_offer";
const LIFETIME: &str = "tenwords_lifetime_limited_49.99";

fn txn(user: &str, product: &str, at: &str, refunded: bool) -> TransactionRecord {
    TransactionRecord::new(
        user,
        product,
        NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap(),
        refunded,
        Some("US".into()),
        Some("fb".into()),
    )
}

/// u1 pays on both sides of the January/February boundary, u2 pays twice in
/// January, u3 and u4 only have refunded lifetime purchases.
fn history() -> Vec<TransactionRecord> {
    vec![
        txn("u1", OFFER, "2024-01-31 23:00:00", false),
        txn("u1", OFFER, "2024-02-07 23:00:00", false),
        txn("u2", OFFER, "2024-01-10 09:00:00", false),
        txn("u2", OFFER, "2024-01-17 09:00:00", false),
        txn("u3", LIFETIME, "2024-02-03 12:00:00", true),
        txn("u4", LIFETIME, "2024-03-01 00:00:00", true),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// January: 0.5 + 0.5 + 9.99 from u1 and u2. February: u1's 9.99 renewal.
/// March holds only a refund and produces no row.
#[test]
fn monthly_revenue_splits_on_month_boundary() {
    let engine = MetricsEngine::build_test("monthly-test".into()).unwrap();
    engine.load_transactions(history()).unwrap();

    let months = engine.monthly_revenue().unwrap();

    let keys: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(keys, vec!["2024-01", "2024-02"]);

    assert!((months[0].revenue - 10.99).abs() < 1e-9);
    assert_eq!(months[0].paying_users, 2);

    assert!((months[1].revenue - 9.99).abs() < 1e-9);
    assert_eq!(months[1].paying_users, 1);
}

/// Another run id sees no months; the engine reads its own run.
#[test]
fn monthly_revenue_is_scoped_to_the_run() {
    let engine = MetricsEngine::build_test("monthly-scope-test".into()).unwrap();
    engine.load_transactions(history()).unwrap();

    assert!(engine.store.monthly_revenue("other-run").unwrap().is_empty());
    assert_eq!(
        engine.store.monthly_revenue("monthly-scope-test").unwrap(),
        engine.monthly_revenue().unwrap()
    );
}
