//! Metric events: the audit trail of one analysis run.
//!
//! Every input load and every computed metric is recorded as one event,
//! serialized to JSON and appended to `event_log`.

use crate::types::{ProductId, RunId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricEvent {
    // ── Inputs ─────────────────────────────────────
    InputLoaded {
        table: String,
        rows: usize,
    },

    // ── Metrics ────────────────────────────────────
    ConversionComputed {
        product_id: ProductId,
        first_payment_users: i64,
        repeat_payment_users: i64,
        conversion_rate: f64,
    },
    LtvForecastComputed {
        product_id: ProductId,
        refund_rate: f64,
        arpu_day: f64,
        avg_lifetime_days: f64,
        horizon_days: u32,
        ltv: f64,
    },
    RomiComputed {
        segments: usize,
        zero_cost_segments: usize,
        unmatched_revenue_segments: i64,
        total_revenue: f64,
        total_costs: f64,
    },

    // ── Outputs ────────────────────────────────────
    RomiExported {
        path: String,
        rows: usize,
    },
}

impl MetricEvent {
    /// Stable name stored in the `event_type` column.
    pub fn type_name(&self) -> &'static str {
        match self {
            MetricEvent::InputLoaded { .. }         => "input_loaded",
            MetricEvent::ConversionComputed { .. }  => "conversion_computed",
            MetricEvent::LtvForecastComputed { .. } => "ltv_forecast_computed",
            MetricEvent::RomiComputed { .. }        => "romi_computed",
            MetricEvent::RomiExported { .. }        => "romi_exported",
        }
    }
}

/// A row of `event_log`.
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub metric:     String,
    pub event_type: String,
    pub payload:    String,
}

impl EventLogEntry {
    pub fn decode(&self) -> serde_json::Result<MetricEvent> {
        serde_json::from_str(&self.payload)
    }
}
