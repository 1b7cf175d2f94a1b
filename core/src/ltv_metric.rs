//! 180-day LTV forecast from ARPU and average lifetime.
//!
//! ltv = min(avg_lifetime_days, horizon) × arpu_day × (1 − refund_rate)
//!
//! The refund rate covers every product; ARPU and lifetime cover only
//! the non-refunded transactions of the target product.

use crate::{
    error::{MetricsError, MetricsResult},
    event::MetricEvent,
    metric::Metric,
    store::{DailyRevenue, MetricsStore, UserLifetime},
    types::ProductId,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LTV_HORIZON_DAYS: u32 = 180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvForecast {
    pub product_id: ProductId,
    pub refund_rate: f64,
    pub arpu_day: f64,
    pub avg_lifetime_days: f64,
    pub horizon_days: u32,
    pub ltv: f64,
    pub daily: Vec<DailyRevenue>,
}

pub struct LtvMetric {
    product_id: ProductId,
    horizon_days: u32,
}

impl LtvMetric {
    pub fn new(product_id: impl Into<ProductId>, horizon_days: u32) -> Self {
        Self {
            product_id: product_id.into(),
            horizon_days,
        }
    }
}

impl Metric for LtvMetric {
    type Output = LtvForecast;

    fn name(&self) -> &'static str {
        "ltv"
    }

    fn compute(&self, run_id: &str, store: &MetricsStore) -> MetricsResult<LtvForecast> {
        let refund_rate = store.refund_rate(run_id)?;
        let daily = store.daily_revenue(run_id, &self.product_id)?;
        let lifetimes = store.user_lifetimes(run_id, &self.product_id)?;

        let (Some(arpu_day), Some(avg_lifetime_days)) =
            (average_daily_arpu(&daily), average_lifetime_days(&lifetimes))
        else {
            return Err(MetricsError::EmptyCohort {
                metric: self.name(),
            });
        };

        let ltv = predict_ltv(arpu_day, avg_lifetime_days, refund_rate, self.horizon_days);
        log::debug!(
            "ltv: arpu/day={arpu_day:.4} lifetime={avg_lifetime_days:.2}d refunds={:.2}% over {} days",
            refund_rate * 100.0,
            daily.len()
        );

        Ok(LtvForecast {
            product_id: self.product_id.clone(),
            refund_rate,
            arpu_day,
            avg_lifetime_days,
            horizon_days: self.horizon_days,
            ltv,
            daily,
        })
    }

    fn event(&self, output: &LtvForecast) -> MetricEvent {
        MetricEvent::LtvForecastComputed {
            product_id: output.product_id.clone(),
            refund_rate: output.refund_rate,
            arpu_day: output.arpu_day,
            avg_lifetime_days: output.avg_lifetime_days,
            horizon_days: output.horizon_days,
            ltv: output.ltv,
        }
    }
}

/// Mean of the per-day ARPU values; `None` without any day.
pub fn average_daily_arpu(daily: &[DailyRevenue]) -> Option<f64> {
    if daily.is_empty() {
        return None;
    }
    Some(daily.iter().map(DailyRevenue::arpu).sum::<f64>() / daily.len() as f64)
}

/// Mean lifetime in whole days; `None` without any user.
pub fn average_lifetime_days(lifetimes: &[UserLifetime]) -> Option<f64> {
    if lifetimes.is_empty() {
        return None;
    }
    let total: i64 = lifetimes.iter().map(UserLifetime::lifetime_days).sum();
    Some(total as f64 / lifetimes.len() as f64)
}

pub fn predict_ltv(arpu_day: f64, avg_lifetime_days: f64, refund_rate: f64, horizon_days: u32) -> f64 {
    avg_lifetime_days.min(horizon_days as f64) * arpu_day * (1.0 - refund_rate)
}
