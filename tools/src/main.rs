//! sim-runner: headless runner for the billing dataset generator.
//!
//! Usage:
//!   sim-runner --seed 44 --customers 500 --out ./out
//!   sim-runner --data-dir ./data --db billing.db --resume
//!   sim-runner --defaults --horizon-end 2025-06-30 --out ./out

use anyhow::{Context, Result};
use billsim_core::{
    billing::{InvoiceStatus, PaymentStatus},
    catalog::Catalog,
    config::GeneratorConfig,
    engine::{BillingDataset, GenerationEngine},
    export,
    ids::{Table, WatermarkResolver},
    store::DatasetStore,
    types::Money,
};
use chrono::NaiveDate;
use std::{env, path::Path};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let use_defaults = args.iter().any(|a| a == "--defaults");
    let resume = args.iter().any(|a| a == "--resume");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let out_dir = string_arg(&args, "--out");
    let db = string_arg(&args, "--db");

    let (mut config, catalog) = if use_defaults {
        (GeneratorConfig::default_test(), Catalog::default_test())
    } else {
        (GeneratorConfig::load(data_dir)?, Catalog::load(data_dir)?)
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.customer_count = parse_arg(&args, "--customers", config.customer_count);
    if let Some(end) = string_arg(&args, "--horizon-end") {
        config.horizon_end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .with_context(|| format!("--horizon-end expects YYYY-MM-DD, got {end}"))?;
    }

    if out_dir.is_none() && db.is_none() {
        log::warn!("neither --out nor --db given; the dataset is generated and discarded");
    }
    if resume && db.is_none() {
        anyhow::bail!("--resume needs --db to read watermarks from");
    }

    println!("Billing dataset generator: sim-runner");
    println!("  seed:      {}", config.seed);
    println!("  customers: {}", config.customer_count);
    println!("  horizon:   {} .. {}", config.horizon_start, config.horizon_end);
    println!("  data_dir:  {}", if use_defaults { "(built-in defaults)" } else { data_dir });
    println!();

    let store = match db {
        Some(path) => {
            let store = DatasetStore::open(path)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };

    let watermarks = match (&store, resume) {
        (Some(store), true) => Some(store as &dyn WatermarkResolver),
        _ => None,
    };
    let mut engine = GenerationEngine::build(config.clone(), catalog, watermarks)?;
    if let (Some(store), true) = (&store, resume) {
        engine = engine.with_existing_emails(store.customer_emails()?);
    }
    let dataset = engine.run()?;

    if let Some(dir) = out_dir {
        export::export_csv(&dataset, Path::new(dir))?;
        println!("CSV files written to {dir}");
    }
    if let Some(store) = &store {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().to_rfc3339();
        store.insert_run(&run_id, config.seed, env!("CARGO_PKG_VERSION"), &started_at)?;
        store.load_dataset(&dataset)?;
        println!("Loaded into {} as run {run_id}", db.unwrap_or_default());
    }

    print_summary(&dataset, store.as_ref())?;
    Ok(())
}

fn print_summary(dataset: &BillingDataset, store: Option<&DatasetStore>) -> Result<()> {
    println!();
    println!("=== RUN SUMMARY ===");
    for table in Table::ALL {
        println!("  {:<24}{}", table.name(), dataset.row_count(table));
    }

    let paid = dataset
        .invoices
        .iter()
        .filter(|i| i.invoice_status == InvoiceStatus::Paid)
        .count();
    let collected: Money = dataset
        .payments
        .iter()
        .filter(|p| p.payment_status == PaymentStatus::Success)
        .map(|p| p.amount_paid)
        .sum();
    let billed: Money = dataset.invoices.iter().map(|i| i.total_due).sum();

    println!();
    println!("=== BILLING SUMMARY ===");
    println!("  invoices paid:    {paid}");
    println!("  invoices pending: {}", dataset.invoices.len() - paid);
    println!("  billed:           {billed}");
    println!("  collected:        {collected}");

    if let Some(store) = store {
        println!();
        println!("=== STORE TOTALS ===");
        for (status, count) in store.invoice_status_counts()? {
            println!("  invoices {status:<8}{count}");
        }
        for table in [Table::Customers, Table::Subscriptions, Table::Invoices] {
            println!("  {:<24}{}", table.name(), store.row_count(table)?);
        }
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
