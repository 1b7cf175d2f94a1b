//! Metric trait.
//!
//! RULE: Every metric implements Metric.
//! A metric reads prepared rows through the store and never writes.
//! The engine records each result in the event log; run order is fixed
//! in engine.rs.

use crate::{error::MetricsResult, event::MetricEvent, store::MetricsStore};

/// The contract every metric must fulfill.
pub trait Metric {
    type Output;

    /// Unique stable name; stored in the `metric` column of the event log.
    fn name(&self) -> &'static str;

    /// Compute the metric for `run_id` from prepared store rows.
    fn compute(&self, run_id: &str, store: &MetricsStore) -> MetricsResult<Self::Output>;

    /// Summarize a result as an event-log entry.
    fn event(&self, output: &Self::Output) -> MetricEvent;
}
