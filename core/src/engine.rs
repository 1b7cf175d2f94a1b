//! The metrics engine: one analysis run over one input pair.
//!
//! PIPELINE (fixed, documented, never reordered):
//!   1. Ingest transactions, number them per user, price them
//!   2. Ingest marketing costs
//!   3. Conversion metric
//!   4. LTV metric
//!   5. ROMI metric, then export
//!
//! RULES:
//!   - Metrics read prepared rows only; numbering and pricing happen once.
//!   - Every load and every metric result is recorded in the event log.

use crate::{
    config::AnalysisConfig,
    conversion_metric::{Conversion, ConversionMetric},
    error::{MetricsError, MetricsResult},
    event::{EventLogEntry, MetricEvent},
    export,
    ingest::{self, InputTable},
    ltv_metric::{LtvForecast, LtvMetric},
    marketing::MarketingCostRecord,
    metric::Metric,
    pricing::PriceTable,
    romi_metric::{RomiMetric, RomiTable},
    store::{MetricsStore, MonthlyRevenue},
    transaction::{assign_transaction_numbers, TransactionRecord},
    types::RunId,
};
use std::path::Path;

/// Everything one full run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub conversion: Conversion,
    pub ltv: LtvForecast,
    pub romi: RomiTable,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

pub struct MetricsEngine {
    pub run_id: RunId,
    pub config: AnalysisConfig,
    pub store:  MetricsStore,
    prices:     PriceTable,
}

impl MetricsEngine {
    /// Register the run in `store` (migrated here) and wire the engine.
    pub fn new(run_id: RunId, config: AnalysisConfig, store: MetricsStore) -> MetricsResult<Self> {
        store.migrate()?;
        store.insert_run(
            &run_id,
            &config.transactions_file,
            &config.marketing_costs_file,
            env!("CARGO_PKG_VERSION"),
        )?;
        log::info!(
            "run={run_id} store={}",
            store.path().unwrap_or(":memory:")
        );
        let prices = PriceTable::new(&config.products);
        Ok(Self {
            run_id,
            config,
            store,
            prices,
        })
    }

    /// In-memory engine with the built-in configuration.
    pub fn build_test(run_id: RunId) -> MetricsResult<Self> {
        Self::new(run_id, AnalysisConfig::default(), MetricsStore::in_memory()?)
    }

    // ── Ingestion ──────────────────────────────────────────────

    /// Read `file_name` from `data_dir` and load it as whichever input the
    /// name identifies. Unknown names are an error.
    pub fn extract_input(&self, data_dir: &Path, file_name: &str) -> MetricsResult<usize> {
        let table = ingest::load_input(data_dir, file_name, &self.config)?;
        if table.is_empty() {
            log::warn!("run={} {file_name} has no data rows", self.run_id);
        }
        match table {
            InputTable::Transactions(records) => self.load_transactions(records),
            InputTable::MarketingCosts(records) => self.load_marketing_costs(&records),
        }
    }

    /// Load both configured inputs from `data_dir`.
    pub fn extract_inputs(&self, data_dir: &Path) -> MetricsResult<()> {
        for file_name in self.config.input_files() {
            self.extract_input(data_dir, &file_name)?;
        }
        Ok(())
    }

    /// Number, price and store raw transactions.
    pub fn load_transactions(&self, mut records: Vec<TransactionRecord>) -> MetricsResult<usize> {
        assign_transaction_numbers(&mut records);
        self.prices.assign_amounts(&mut records);
        let inserted = self.store.insert_transactions(&self.run_id, &records)?;
        self.record("ingest", &MetricEvent::InputLoaded {
            table: "transactions".into(),
            rows: inserted,
        })?;
        log::info!("run={} loaded {inserted} transactions", self.run_id);
        Ok(inserted)
    }

    pub fn load_marketing_costs(&self, records: &[MarketingCostRecord]) -> MetricsResult<usize> {
        let inserted = self.store.insert_marketing_costs(&self.run_id, records)?;
        self.record("ingest", &MetricEvent::InputLoaded {
            table: "marketing_costs".into(),
            rows: inserted,
        })?;
        log::info!("run={} loaded {inserted} marketing cost rows", self.run_id);
        Ok(inserted)
    }

    // ── Metrics ────────────────────────────────────────────────

    /// Compute one metric and append its result to the event log.
    pub fn run_metric<M: Metric>(&self, metric: &M) -> MetricsResult<M::Output> {
        let output = metric.compute(&self.run_id, &self.store)?;
        self.record(metric.name(), &metric.event(&output))?;
        Ok(output)
    }

    pub fn conversion(&self) -> MetricsResult<Conversion> {
        self.require_transactions()?;
        let conversion = self.run_metric(&ConversionMetric::new(self.config.target_product.clone()))?;
        log::info!(
            "run={} conversion {:.2}% ({}/{})",
            self.run_id,
            conversion.rate,
            conversion.repeat_payment_users,
            conversion.first_payment_users
        );
        Ok(conversion)
    }

    pub fn ltv_forecast(&self) -> MetricsResult<LtvForecast> {
        self.require_transactions()?;
        let metric = LtvMetric::new(self.config.target_product.clone(), self.config.ltv_horizon_days);
        let forecast = self.run_metric(&metric)?;
        log::info!("run={} ltv forecast {:.2}", self.run_id, forecast.ltv);
        Ok(forecast)
    }

    pub fn romi(&self) -> MetricsResult<RomiTable> {
        self.require_transactions()?;
        if self.store.marketing_cost_count(&self.run_id)? == 0 {
            return Err(MetricsError::MissingInput {
                run_id: self.run_id.clone(),
                table: "marketing_costs",
            });
        }
        let table = self.run_metric(&RomiMetric)?;
        log::info!("run={} romi over {} segments", self.run_id, table.rows.len());
        Ok(table)
    }

    pub fn monthly_revenue(&self) -> MetricsResult<Vec<MonthlyRevenue>> {
        self.store.monthly_revenue(&self.run_id)
    }

    /// Run every metric in pipeline order.
    pub fn run_all(&self) -> MetricsResult<AnalysisReport> {
        Ok(AnalysisReport {
            conversion: self.conversion()?,
            ltv: self.ltv_forecast()?,
            romi: self.romi()?,
            monthly_revenue: self.monthly_revenue()?,
        })
    }

    // ── Output ─────────────────────────────────────────────────

    pub fn export_romi(&self, table: &RomiTable, path: &Path) -> MetricsResult<usize> {
        let rows = export::write_romi_table(table, path)?;
        self.record("export", &MetricEvent::RomiExported {
            path: path.display().to_string(),
            rows,
        })?;
        Ok(rows)
    }

    pub fn events(&self) -> MetricsResult<Vec<EventLogEntry>> {
        self.store.events_for_run(&self.run_id)
    }

    fn require_transactions(&self) -> MetricsResult<()> {
        if self.store.transaction_count(&self.run_id)? == 0 {
            return Err(MetricsError::MissingInput {
                run_id: self.run_id.clone(),
                table: "transactions",
            });
        }
        Ok(())
    }

    fn record(&self, metric: &str, event: &MetricEvent) -> MetricsResult<()> {
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            metric:     metric.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        self.store.append_event(&entry)
    }
}
