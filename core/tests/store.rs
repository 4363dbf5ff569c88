//! SQLite store: loading, watermarks and resumed runs.

use billsim_core::{
    catalog::Catalog,
    config::GeneratorConfig,
    engine::{BillingDataset, GenerationEngine},
    ids::{Table, WatermarkResolver},
    store::DatasetStore,
};
use std::collections::HashSet;

fn store() -> DatasetStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = DatasetStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn config() -> GeneratorConfig {
    GeneratorConfig { seed: 21, customer_count: 40, ..GeneratorConfig::default_test() }
}

fn generate(resolver: Option<&dyn WatermarkResolver>, emails: Vec<String>) -> BillingDataset {
    GenerationEngine::build(config(), Catalog::default_test(), resolver)
        .unwrap()
        .with_existing_emails(emails)
        .run()
        .unwrap()
}

fn max_generated_id(dataset: &BillingDataset, table: Table) -> Option<u64> {
    match table {
        Table::Customers => dataset.customers.iter().map(|r| r.customer_id).max(),
        Table::Products => dataset.products.iter().map(|r| r.product_id).max(),
        Table::Plans => dataset.plans.iter().map(|r| r.plan_id).max(),
        Table::Discounts => dataset.discounts.iter().map(|r| r.discount_id).max(),
        Table::Subscriptions => dataset.subscriptions.iter().map(|r| r.subscription_id).max(),
        Table::SubscriptionDiscounts => {
            dataset.subscription_discounts.iter().map(|r| r.sub_discount_id).max()
        }
        Table::Invoices => dataset.invoices.iter().map(|r| r.invoice_id).max(),
        Table::LineItems => dataset.line_items.iter().map(|r| r.line_item_id).max(),
        Table::Payments => dataset.payments.iter().map(|r| r.payment_id).max(),
    }
}

#[test]
fn loaded_row_counts_match_dataset() {
    let store = store();
    let dataset = generate(None, Vec::new());
    store.load_dataset(&dataset).unwrap();

    for table in Table::ALL {
        assert_eq!(
            store.row_count(table).unwrap() as usize,
            dataset.row_count(table),
            "{}",
            table.name()
        );
    }
}

#[test]
fn watermarks_are_max_loaded_ids() {
    let store = store();
    let dataset = generate(None, Vec::new());
    store.load_dataset(&dataset).unwrap();

    for table in Table::ALL {
        assert_eq!(
            store.max_id(table).unwrap(),
            max_generated_id(&dataset, table),
            "{}",
            table.name()
        );
    }
}

#[test]
fn resumed_run_continues_ids_and_loads_cleanly() {
    let store = store();
    let first = generate(None, Vec::new());
    store.load_dataset(&first).unwrap();

    let second = generate(Some(&store as &dyn WatermarkResolver), store.customer_emails().unwrap());
    for table in Table::ALL.iter().filter(|t| !t.is_static()) {
        if let (Some(prev_max), Some(next_min)) = (
            max_generated_id(&first, *table),
            min_generated_id(&second, *table),
        ) {
            assert_eq!(next_min, prev_max + 1, "{}", table.name());
        }
    }

    let first_emails: HashSet<&str> =
        first.customers.iter().map(|c| c.customer_email.as_str()).collect();
    assert!(second
        .customers
        .iter()
        .all(|c| !first_emails.contains(c.customer_email.as_str())));

    store.load_dataset(&second).unwrap();
    for table in Table::ALL {
        let expected = if table.is_static() {
            first.row_count(table)
        } else {
            first.row_count(table) + second.row_count(table)
        };
        assert_eq!(store.row_count(table).unwrap() as usize, expected, "{}", table.name());
    }
}

#[test]
fn colliding_load_rolls_back_entirely() {
    let store = store();
    let dataset = generate(None, Vec::new());
    store.load_dataset(&dataset).unwrap();

    assert!(store.load_dataset(&dataset).is_err());
    for table in Table::ALL {
        assert_eq!(store.row_count(table).unwrap() as usize, dataset.row_count(table));
    }
}

#[test]
fn invoice_status_counts_cover_every_invoice() {
    let store = store();
    let dataset = generate(None, Vec::new());
    store.load_dataset(&dataset).unwrap();

    let counts = store.invoice_status_counts().unwrap();
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    assert_eq!(total as usize, dataset.invoices.len());
    assert!(counts.iter().all(|(status, _)| status == "paid" || status == "pending"));
}

fn min_generated_id(dataset: &BillingDataset, table: Table) -> Option<u64> {
    match table {
        Table::Customers => dataset.customers.first().map(|r| r.customer_id),
        Table::Subscriptions => dataset.subscriptions.first().map(|r| r.subscription_id),
        Table::SubscriptionDiscounts => {
            dataset.subscription_discounts.first().map(|r| r.sub_discount_id)
        }
        Table::Invoices => dataset.invoices.first().map(|r| r.invoice_id),
        Table::LineItems => dataset.line_items.first().map(|r| r.line_item_id),
        Table::Payments => dataset.payments.first().map(|r| r.payment_id),
        Table::Products | Table::Plans | Table::Discounts => None,
    }
}
