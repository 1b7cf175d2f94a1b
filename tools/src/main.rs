//! romi-runner: headless batch runner for the subscription metrics.
//!
//! Usage:
//!   romi-runner --data-dir ./exports
//!   romi-runner --data-dir ./exports --repair --db run.db --output romi.xlsx
//!   romi-runner --config data/analysis_config.json

use anyhow::Result;
use romi_core::{
    config::AnalysisConfig,
    engine::{AnalysisReport, MetricsEngine},
    repair::repair_cost_sheet,
    store::MetricsStore,
};
use std::env;
use std::path::{Path, PathBuf};
use uuid::Uuid;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = PathBuf::from(arg_value(&args, "--data-dir").unwrap_or("."));
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let repair = args.iter().any(|a| a == "--repair");

    let config = match arg_value(&args, "--config") {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    let output = arg_value(&args, "--output")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(&config.output_file));

    let run_id = format!("run-{}", Uuid::new_v4());

    println!("romi-runner: subscription metrics");
    println!("  run_id:    {run_id}");
    println!("  data_dir:  {}", data_dir.display());
    println!("  db:        {db}");
    println!("  output:    {}", output.display());
    println!();

    if repair {
        let repaired = repair_cost_sheet(
            &data_dir.join(&config.raw_marketing_costs_file),
            &data_dir.join(&config.marketing_costs_file),
            &config.repair,
        )?;
        println!("Repaired {repaired} cost rows into {}", config.marketing_costs_file);
    }

    let store = if db == ":memory:" {
        MetricsStore::in_memory()?
    } else {
        MetricsStore::open(db)?
    };
    let engine = MetricsEngine::new(run_id, config, store)?;
    engine.extract_inputs(&data_dir)?;

    let report = engine.run_all()?;

    println!(
        "First-second payment user conversion: {:.2}%",
        report.conversion.rate
    );
    println!(
        "LTV forecast based on ARPU and average lifetime {:.2}",
        report.ltv.ltv
    );

    let rows = engine.export_romi(&report.romi, &output)?;
    print_summary(&engine, &report, rows, &output);
    Ok(())
}

fn print_summary(engine: &MetricsEngine, report: &AnalysisReport, rows: usize, output: &Path) {
    let ltv = &report.ltv;
    let romi = &report.romi;

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", engine.run_id);
    println!("  product:         {}", engine.config.target_product);
    println!(
        "  payers:          {} ({} repeat)",
        report.conversion.first_payment_users, report.conversion.repeat_payment_users
    );
    println!("  refund rate:     {:.2}%", ltv.refund_rate * 100.0);
    println!("  arpu/day:        {:.4}", ltv.arpu_day);
    println!("  avg lifetime:    {:.1} days", ltv.avg_lifetime_days);
    println!("  horizon:         {} days", ltv.horizon_days);

    println!();
    println!("=== ROMI ===");
    println!("  segments:        {}", romi.rows.len());
    println!("  zero-cost:       {}", romi.zero_cost_segments());
    println!("  unmatched:       {}", romi.unmatched_revenue_segments);
    println!("  revenue:         {:.2}", romi.total_revenue());
    println!("  costs:           {:.2}", romi.total_costs());
    match romi.overall_romi() {
        Some(overall) => println!("  overall romi:    {overall:.2}%"),
        None => println!("  overall romi:    n/a"),
    }
    println!("  written:         {rows} rows → {}", output.display());

    if !report.monthly_revenue.is_empty() {
        println!();
        println!("=== MONTHLY REVENUE ===");
        for m in &report.monthly_revenue {
            println!("  {} | Revenue: {:.2} | Payers: {}", m.month, m.revenue, m.paying_users);
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
