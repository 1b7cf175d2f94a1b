//! First-to-second payment conversion.
//!
//! Cohort: non-refunded transactions of one product. Transaction numbers
//! come from the user's full history, so a user counts as converted when
//! any of their cohort payments is their second or later.

use crate::{
    error::{MetricsError, MetricsResult},
    event::MetricEvent,
    metric::Metric,
    store::MetricsStore,
    types::ProductId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub product_id: ProductId,
    pub first_payment_users: i64,
    pub repeat_payment_users: i64,
    /// Percentage in [0, 100].
    pub rate: f64,
}

pub struct ConversionMetric {
    product_id: ProductId,
}

impl ConversionMetric {
    pub fn new(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: product_id.into(),
        }
    }
}

impl Metric for ConversionMetric {
    type Output = Conversion;

    fn name(&self) -> &'static str {
        "conversion"
    }

    fn compute(&self, run_id: &str, store: &MetricsStore) -> MetricsResult<Conversion> {
        let (payers, repeat) = store.conversion_counts(run_id, &self.product_id)?;
        if payers == 0 {
            return Err(MetricsError::EmptyCohort {
                metric: self.name(),
            });
        }
        let rate = conversion_rate(payers, repeat);
        log::debug!(
            "conversion: {repeat}/{payers} users of {} paid twice or more",
            self.product_id
        );
        Ok(Conversion {
            product_id: self.product_id.clone(),
            first_payment_users: payers,
            repeat_payment_users: repeat,
            rate,
        })
    }

    fn event(&self, output: &Conversion) -> MetricEvent {
        MetricEvent::ConversionComputed {
            product_id: output.product_id.clone(),
            first_payment_users: output.first_payment_users,
            repeat_payment_users: output.repeat_payment_users,
            conversion_rate: output.rate,
        }
    }
}

/// `repeat / payers × 100`, clamped to [0, 100]; zero for an empty cohort.
pub fn conversion_rate(payers: i64, repeat: i64) -> f64 {
    if payers <= 0 {
        return 0.0;
    }
    (repeat as f64 / payers as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_a_bounded_percentage() {
        assert_eq!(conversion_rate(4, 1), 25.0);
        assert_eq!(conversion_rate(3, 3), 100.0);
        assert_eq!(conversion_rate(5, 0), 0.0);
        assert_eq!(conversion_rate(0, 0), 0.0);
    }
}
