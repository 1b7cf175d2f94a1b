use super::{
    parse_date, parse_timestamp, DailyRevenue, MetricsStore, MonthlyRevenue, UserLifetime,
    DATE_FORMAT, TIMESTAMP_FORMAT,
};
use crate::{error::MetricsResult, transaction::TransactionRecord};
use rusqlite::params;

impl MetricsStore {
    // ── Transactions ───────────────────────────────────────────

    /// Insert prepared transactions in one SQL transaction.
    /// Every record must already carry its transaction number.
    pub fn insert_transactions(
        &self,
        run_id: &str,
        records: &[TransactionRecord],
    ) -> MetricsResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO user_transaction (
                    run_id, user_id, product_id, purchase_ts, purchase_date,
                    refunded, country_code, media_source, transaction_number, amount
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for record in records {
                let number = record.transaction_number.ok_or_else(|| {
                    anyhow::anyhow!(
                        "transaction of user {} at {} has no transaction number",
                        record.user_id,
                        record.purchase_date
                    )
                })?;
                stmt.execute(params![
                    run_id,
                    record.user_id,
                    record.product_id,
                    record.purchase_date.format(TIMESTAMP_FORMAT).to_string(),
                    record.purchase_day().format(DATE_FORMAT).to_string(),
                    record.refunded,
                    record.country_code,
                    record.media_source,
                    number,
                    record.amount,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn transaction_count(&self, run_id: &str) -> MetricsResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM user_transaction WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// One user's prepared transactions in transaction-number order.
    pub fn user_history(&self, run_id: &str, user_id: &str) -> MetricsResult<Vec<TransactionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, product_id, purchase_ts, refunded, country_code,
                    media_source, transaction_number, amount
             FROM user_transaction
             WHERE run_id = ?1 AND user_id = ?2
             ORDER BY transaction_number ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id, user_id], |row| {
                Ok(TransactionRecord {
                    user_id: row.get(0)?,
                    product_id: row.get(1)?,
                    purchase_date: parse_timestamp(&row.get::<_, String>(2)?)?,
                    refunded: row.get(3)?,
                    country_code: row.get(4)?,
                    media_source: row.get(5)?,
                    transaction_number: Some(row.get(6)?),
                    amount: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Share of all transactions (every product) that were refunded, in [0, 1].
    pub fn refund_rate(&self, run_id: &str) -> MetricsResult<f64> {
        let rate = self.conn.query_row(
            "SELECT COALESCE(AVG(refunded), 0.0) FROM user_transaction WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(rate)
    }

    /// Distinct paying users of `product_id`, and those among them with a
    /// second or later payment. Refunded transactions are excluded.
    pub fn conversion_counts(&self, run_id: &str, product_id: &str) -> MetricsResult<(i64, i64)> {
        let counts = self.conn.query_row(
            "SELECT COUNT(DISTINCT user_id),
                    COUNT(DISTINCT CASE WHEN transaction_number >= 2 THEN user_id END)
             FROM user_transaction
             WHERE run_id = ?1 AND product_id = ?2 AND refunded = 0",
            params![run_id, product_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }

    /// Per-day revenue and distinct payers of `product_id`, refunds excluded.
    pub fn daily_revenue(&self, run_id: &str, product_id: &str) -> MetricsResult<Vec<DailyRevenue>> {
        let mut stmt = self.conn.prepare(
            "SELECT purchase_date,
                    COALESCE(SUM(amount), 0.0),
                    COUNT(DISTINCT user_id)
             FROM user_transaction
             WHERE run_id = ?1 AND product_id = ?2 AND refunded = 0
             GROUP BY purchase_date
             ORDER BY purchase_date ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id, product_id], |row| {
                Ok(DailyRevenue {
                    date: parse_date(&row.get::<_, String>(0)?)?,
                    revenue: row.get(1)?,
                    unique_users: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// First and last non-refunded purchase of `product_id` per user.
    pub fn user_lifetimes(&self, run_id: &str, product_id: &str) -> MetricsResult<Vec<UserLifetime>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, MIN(purchase_ts), MAX(purchase_ts)
             FROM user_transaction
             WHERE run_id = ?1 AND product_id = ?2 AND refunded = 0
             GROUP BY user_id
             ORDER BY user_id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id, product_id], |row| {
                Ok(UserLifetime {
                    user_id: row.get(0)?,
                    first_purchase: parse_timestamp(&row.get::<_, String>(1)?)?,
                    last_purchase: parse_timestamp(&row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Non-refunded revenue and payers per calendar month, every product.
    pub fn monthly_revenue(&self, run_id: &str) -> MetricsResult<Vec<MonthlyRevenue>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(purchase_date, 1, 7) AS month,
                    COALESCE(SUM(amount), 0.0),
                    COUNT(DISTINCT user_id)
             FROM user_transaction
             WHERE run_id = ?1 AND refunded = 0
             GROUP BY month
             ORDER BY month ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(MonthlyRevenue {
                    month: row.get(0)?,
                    revenue: row.get(1)?,
                    paying_users: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
