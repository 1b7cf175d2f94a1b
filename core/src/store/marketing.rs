use super::{parse_date, MetricsStore, SegmentSpend, DATE_FORMAT};
use crate::{error::MetricsResult, marketing::MarketingCostRecord};
use rusqlite::params;

impl MetricsStore {
    // ── Marketing costs ────────────────────────────────────────

    pub fn insert_marketing_costs(
        &self,
        run_id: &str,
        records: &[MarketingCostRecord],
    ) -> MetricsResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO marketing_cost (run_id, date, country_code, media_source, costs)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                stmt.execute(params![
                    run_id,
                    record.date.format(DATE_FORMAT).to_string(),
                    record.country_code,
                    record.media_source,
                    record.costs,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn marketing_cost_count(&self, run_id: &str) -> MetricsResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM marketing_cost WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── ROMI join ──────────────────────────────────────────────

    /// Revenue of every transaction grouped by (day, country, media source),
    /// inner-joined to cost grouped the same way.
    ///
    /// Segments missing on either side are dropped. A NULL country or
    /// media source never matches.
    pub fn segment_spend(&self, run_id: &str) -> MetricsResult<Vec<SegmentSpend>> {
        let mut stmt = self.conn.prepare(
            "WITH revenue AS (
                 SELECT purchase_date AS date, country_code, media_source,
                        COALESCE(SUM(amount), 0.0) AS revenue
                 FROM user_transaction
                 WHERE run_id = ?1
                 GROUP BY purchase_date, country_code, media_source
             ),
             spend AS (
                 SELECT date, country_code, media_source, SUM(costs) AS costs
                 FROM marketing_cost
                 WHERE run_id = ?1
                 GROUP BY date, country_code, media_source
             )
             SELECT r.date, r.country_code, r.media_source, r.revenue, s.costs
             FROM revenue r
             JOIN spend s
               ON s.date = r.date
              AND s.country_code = r.country_code
              AND s.media_source = r.media_source
             ORDER BY r.date, r.country_code, r.media_source",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(SegmentSpend {
                    date: parse_date(&row.get::<_, String>(0)?)?,
                    country_code: row.get(1)?,
                    media_source: row.get(2)?,
                    revenue: row.get(3)?,
                    costs: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Revenue segments that found no cost row (including NULL keys).
    pub fn unmatched_revenue_segments(&self, run_id: &str) -> MetricsResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM (
                 SELECT purchase_date, country_code, media_source
                 FROM user_transaction
                 WHERE run_id = ?1
                 GROUP BY purchase_date, country_code, media_source
             ) r
             WHERE NOT EXISTS (
                 SELECT 1 FROM marketing_cost c
                 WHERE c.run_id = ?1
                   AND c.date = r.purchase_date
                   AND c.country_code = r.country_code
                   AND c.media_source = r.media_source
             )",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
