//! SQLite working store.
//!
//! RULE: Only the store talks to the database.
//! Metrics call store methods and never execute SQL directly.
//!
//! Every table is scoped by `run_id`, so one database file can hold
//! several analysis runs side by side.

use crate::{error::MetricsResult, event::EventLogEntry};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
mod marketing;
mod transactions;

/// Storage format of `purchase_ts`. Fixed width, so text order is time order.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
/// Storage format of calendar dates.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Aggregate rows ─────────────────────────────────────────────

/// Revenue and distinct payers of one purchase day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
    pub unique_users: i64,
}

impl DailyRevenue {
    pub fn arpu(&self) -> f64 {
        if self.unique_users > 0 {
            self.revenue / self.unique_users as f64
        } else {
            0.0
        }
    }
}

/// First and last purchase of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserLifetime {
    pub user_id: String,
    pub first_purchase: NaiveDateTime,
    pub last_purchase: NaiveDateTime,
}

impl UserLifetime {
    /// Whole days between first and last purchase.
    pub fn lifetime_days(&self) -> i64 {
        (self.last_purchase - self.first_purchase).num_days()
    }
}

/// Revenue and distinct payers of one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
    pub paying_users: i64,
}

/// Revenue and marketing cost of one (date, country, media source) segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpend {
    pub date: NaiveDate,
    pub country_code: String,
    pub media_source: String,
    pub revenue: f64,
    pub costs: f64,
}

pub struct MetricsStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl MetricsStore {
    pub fn open(path: &str) -> MetricsResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (the default for a one-off run, and tests).
    pub fn in_memory() -> MetricsResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> MetricsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_transactions.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_marketing_costs.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        transactions_file: &str,
        costs_file: &str,
        version: &str,
    ) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, transactions_file, costs_file, version, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                transactions_file,
                costs_file,
                version,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn run_exists(&self, run_id: &str) -> MetricsResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, metric, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.metric,
                entry.event_type,
                entry.payload,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> MetricsResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, metric, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    metric: row.get(2)?,
                    event_type: row.get(3)?,
                    payload: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

pub(crate) fn parse_date(raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}
