//! Return on marketing investment per (date, country, media source).
//!
//! romi = (revenue − costs) / costs × 100
//!
//! Revenue covers every transaction, refunded or not, as billed. A segment
//! with zero cost keeps its row but gets no ROMI.

use crate::{
    error::MetricsResult,
    event::MetricEvent,
    metric::Metric,
    store::{MetricsStore, SegmentSpend},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomiRow {
    pub date: NaiveDate,
    pub country_code: String,
    pub media_source: String,
    pub revenue: f64,
    pub costs: f64,
    /// `None` when `costs` is zero.
    pub romi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomiTable {
    pub rows: Vec<RomiRow>,
    pub unmatched_revenue_segments: i64,
}

impl RomiTable {
    pub fn zero_cost_segments(&self) -> usize {
        self.rows.iter().filter(|r| r.romi.is_none()).count()
    }

    pub fn total_revenue(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue).sum()
    }

    pub fn total_costs(&self) -> f64 {
        self.rows.iter().map(|r| r.costs).sum()
    }

    /// ROMI of the joined segments taken together.
    pub fn overall_romi(&self) -> Option<f64> {
        romi(self.total_revenue(), self.total_costs())
    }
}

pub struct RomiMetric;

impl Metric for RomiMetric {
    type Output = RomiTable;

    fn name(&self) -> &'static str {
        "romi"
    }

    fn compute(&self, run_id: &str, store: &MetricsStore) -> MetricsResult<RomiTable> {
        let rows: Vec<RomiRow> = store
            .segment_spend(run_id)?
            .into_iter()
            .map(RomiRow::from)
            .collect();
        let unmatched = store.unmatched_revenue_segments(run_id)?;

        for row in rows.iter().filter(|r| r.romi.is_none()) {
            log::warn!(
                "romi: zero cost for {} {} {}; segment flagged",
                row.date,
                row.country_code,
                row.media_source
            );
        }
        if unmatched > 0 {
            log::warn!("romi: {unmatched} revenue segments had no matching cost row and were dropped");
        }

        Ok(RomiTable {
            rows,
            unmatched_revenue_segments: unmatched,
        })
    }

    fn event(&self, output: &RomiTable) -> MetricEvent {
        MetricEvent::RomiComputed {
            segments: output.rows.len(),
            zero_cost_segments: output.zero_cost_segments(),
            unmatched_revenue_segments: output.unmatched_revenue_segments,
            total_revenue: output.total_revenue(),
            total_costs: output.total_costs(),
        }
    }
}

impl From<SegmentSpend> for RomiRow {
    fn from(s: SegmentSpend) -> Self {
        Self {
            romi: romi(s.revenue, s.costs),
            date: s.date,
            country_code: s.country_code,
            media_source: s.media_source,
            revenue: s.revenue,
            costs: s.costs,
        }
    }
}

/// `(revenue − costs) / costs × 100`, or `None` for zero cost.
pub fn romi(revenue: f64, costs: f64) -> Option<f64> {
    if costs == 0.0 {
        return None;
    }
    Some((revenue - costs) / costs * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn romi_formula() {
        assert_eq!(romi(150.0, 100.0), Some(50.0));
        assert_eq!(romi(50.0, 100.0), Some(-50.0));
        assert_eq!(romi(0.0, 20.0), Some(-100.0));
        assert_eq!(romi(10.0, 0.0), None);
    }
}
