//! romi-core: subscription conversion, LTV and ROMI from spreadsheet exports.

pub mod config;
pub mod conversion_metric;
pub mod engine;
pub mod error;
pub mod event;
pub mod export;
pub mod ingest;
pub mod ltv_metric;
pub mod marketing;
pub mod metric;
pub mod pricing;
pub mod repair;
pub mod romi_metric;
pub mod store;
pub mod transaction;
pub mod types;
