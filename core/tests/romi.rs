//! ROMI per (date, country, media source) segment.

use chrono::{NaiveDate, NaiveDateTime};
use romi_core::{
    engine::MetricsEngine, error::MetricsError, marketing::MarketingCostRecord,
    transaction::TransactionRecord,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const OFFER: &str = "tenwords_1w_9.99_offer";
const FREE_TRIAL: &str = "tenwords_1w_7.99_7free";
const LIFETIME: &str = "tenwords_lifetime_limited_49.99";

fn txn(user: &str, product: &str, at: &str, refunded: bool, country: &str, media: &str) -> TransactionRecord {
    TransactionRecord::new(
        user,
        product,
        NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap(),
        refunded,
        Some(country.into()),
        Some(media.into()),
    )
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn cost(d: u32, country: &str, media: &str, amount: f64) -> MarketingCostRecord {
    MarketingCostRecord::new(day(d), country, media, amount)
}

fn loaded_engine(run_id: &str) -> MetricsEngine {
    let engine = MetricsEngine::build_test(run_id.into()).unwrap();
    engine
        .load_transactions(vec![
            txn("u1", OFFER, "2024-01-01 10:00:00", false, "US", "fb"),
            txn("u2", OFFER, "2024-01-01 12:00:00", false, "US", "fb"),
            txn("u4", FREE_TRIAL, "2024-01-01 08:00:00", false, "US", "google"),
            txn("u3", OFFER, "2024-01-02 09:00:00", false, "DE", "fb"),
            txn("u5", LIFETIME, "2024-01-02 15:00:00", false, "DE", "fb"),
            txn("u4", OFFER, "2024-01-03 08:00:00", false, "US", "fb"),
            txn("u1", OFFER, "2024-01-08 10:00:00", false, "US", "fb"),
            txn("u3", OFFER, "2024-01-09 09:00:00", true, "DE", "fb"),
            txn("u1", OFFER, "2024-01-15 10:00:00", false, "US", "fb"),
        ])
        .unwrap();
    engine
        .load_marketing_costs(&[
            cost(1, "US", "fb", 2.0),
            cost(1, "US", "google", 0.0),
            cost(2, "DE", "fb", 25.0),
            cost(2, "DE", "fb", 5.0),
            cost(3, "US", "fb", 5.0),
            cost(4, "US", "fb", 10.0),
        ])
        .unwrap();
    engine
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Only segments present on both sides survive, in key order.
#[test]
fn inner_join_keeps_matching_segments() {
    let engine = loaded_engine("romi-join-test");

    let table = engine.romi().unwrap();

    let keys: Vec<(NaiveDate, &str, &str)> = table
        .rows
        .iter()
        .map(|r| (r.date, r.country_code.as_str(), r.media_source.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (day(1), "US", "fb"),
            (day(1), "US", "google"),
            (day(2), "DE", "fb"),
            (day(3), "US", "fb"),
        ]
    );
    // Jan 8, Jan 9 and Jan 15 revenue has no spend row.
    assert_eq!(table.unmatched_revenue_segments, 3);
}

/// romi = (revenue − cost) / cost × 100 on every joined row.
#[test]
fn romi_formula_holds_for_every_segment() {
    let engine = loaded_engine("romi-formula-test");

    let table = engine.romi().unwrap();

    for row in table.rows.iter().filter(|r| r.costs != 0.0) {
        let expected = (row.revenue - row.costs) / row.costs * 100.0;
        assert!((row.romi.unwrap() - expected).abs() < 1e-9);
    }

    let jan1 = &table.rows[0];
    assert!((jan1.revenue - 1.0).abs() < 1e-9);
    assert!((jan1.romi.unwrap() + 50.0).abs() < 1e-9);

    // Two spend rows for Jan 2 DE fb are summed before the join.
    let jan2 = &table.rows[2];
    assert!((jan2.costs - 30.0).abs() < 1e-9);
    assert!((jan2.revenue - 50.49).abs() < 1e-9);
}

/// Zero spend keeps the row but flags it instead of dividing by zero.
#[test]
fn zero_cost_segment_is_flagged() {
    let engine = loaded_engine("romi-zero-cost-test");

    let table = engine.romi().unwrap();

    let google = &table.rows[1];
    assert_eq!(google.media_source, "google");
    assert_eq!(google.costs, 0.0);
    assert_eq!(google.romi, None);
    assert_eq!(table.zero_cost_segments(), 1);
}

/// A missing media source never joins, even against another missing one.
#[test]
fn missing_keys_never_join() {
    let engine = MetricsEngine::build_test("romi-null-key-test".into()).unwrap();
    let mut row = txn("u", OFFER, "2024-01-03 08:00:00", false, "US", "fb");
    row.media_source = None;
    engine.load_transactions(vec![row]).unwrap();
    engine
        .load_marketing_costs(&[MarketingCostRecord {
            date: day(3),
            country_code: Some("US".into()),
            media_source: None,
            costs: 4.0,
        }])
        .unwrap();

    let table = engine.romi().unwrap();

    assert!(table.rows.is_empty());
    assert_eq!(table.unmatched_revenue_segments, 1);
}

/// ROMI needs spend data.
#[test]
fn romi_without_costs_is_missing_input() {
    let engine = MetricsEngine::build_test("romi-missing-costs-test".into()).unwrap();
    engine
        .load_transactions(vec![txn("u", OFFER, "2024-01-03 08:00:00", false, "US", "fb")])
        .unwrap();

    let err = engine.romi().unwrap_err();
    assert!(matches!(
        err,
        MetricsError::MissingInput { table: "marketing_costs", .. }
    ));
}
