//! Marketing spend rows, one per (date, country, media source).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingCostRecord {
    pub date: NaiveDate,
    pub country_code: Option<String>,
    pub media_source: Option<String>,
    pub costs: f64,
}

impl MarketingCostRecord {
    pub fn new(
        date: NaiveDate,
        country_code: impl Into<String>,
        media_source: impl Into<String>,
        costs: f64,
    ) -> Self {
        Self {
            date,
            country_code: Some(country_code.into()),
            media_source: Some(media_source.into()),
            costs,
        }
    }
}
