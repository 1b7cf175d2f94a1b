use crate::{ltv_metric::DEFAULT_LTV_HORIZON_DAYS, types::ProductId};
use serde::{Deserialize, Serialize};

/// Price of one subscription product.
///
/// `first_payment` applies to a user's first transaction overall,
/// `renewal` to every later one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPrice {
    pub product_id: ProductId,
    pub first_payment: f64,
    pub renewal: f64,
}

/// Columns used when repairing the raw marketing export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    pub source_column: String,
    pub target_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub transactions_file: String,
    pub marketing_costs_file: String,
    pub raw_marketing_costs_file: String,
    pub output_file: String,
    /// Product whose cohort feeds the conversion and LTV metrics.
    pub target_product: ProductId,
    pub ltv_horizon_days: u32,
    #[serde(default)]
    pub dropped_cost_columns: Vec<String>,
    pub products: Vec<ProductPrice>,
    pub repair: RepairConfig,
}

impl AnalysisConfig {
    /// Load from a JSON file, typically `data/analysis_config.json`.
    /// Without a file, use `AnalysisConfig::default()`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalysisConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.products.is_empty() {
            anyhow::bail!("{path}: product catalog is empty");
        }
        Ok(config)
    }

    /// Both input file names, in the order they are expected.
    pub fn input_files(&self) -> Vec<String> {
        vec![
            self.transactions_file.clone(),
            self.marketing_costs_file.clone(),
        ]
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            transactions_file: "Product analyst - File 1.xlsx".into(),
            marketing_costs_file: "Файл 2 fix.xlsx".into(),
            raw_marketing_costs_file: "Файл 2.xlsx".into(),
            output_file: "romi_result.xlsx".into(),
            target_product: "tenwords_1w_9.99_offer".into(),
            ltv_horizon_days: DEFAULT_LTV_HORIZON_DAYS,
            dropped_cost_columns: vec!["cost_wrong".into(), "type".into(), "format".into()],
            products: vec![
                ProductPrice {
                    product_id: "tenwords_1w_7.99_7free".into(),
                    first_payment: 0.0,
                    renewal: 7.99,
                },
                ProductPrice {
                    product_id: "tenwords_1w_9.99_offer".into(),
                    first_payment: 0.5,
                    renewal: 9.99,
                },
                ProductPrice {
                    product_id: "tenwords_lifetime_limited_49.99".into(),
                    first_payment: 49.99,
                    renewal: 49.99,
                },
            ],
            repair: RepairConfig {
                source_column: "C".into(),
                target_column: "G".into(),
            },
        }
    }
}
