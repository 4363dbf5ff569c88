//! CSV file export.
//!
//! One file per table, header row first. Option fields become empty
//! cells, money is written as a decimal string, dates as YYYY-MM-DD.

use crate::{engine::BillingDataset, error::SimResult, ids::Table};
use serde::Serialize;
use std::{fs, io::Write, path::Path};

/// Serialize `rows` as CSV into any writer.
pub fn write_table<W: Write, T: Serialize>(writer: W, rows: &[T]) -> SimResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Serialize one table of the dataset into any writer.
pub fn write_dataset_table<W: Write>(
    writer: W,
    dataset: &BillingDataset,
    table: Table,
) -> SimResult<()> {
    match table {
        Table::Customers => write_table(writer, &dataset.customers),
        Table::Products => write_table(writer, &dataset.products),
        Table::Plans => write_table(writer, &dataset.plans),
        Table::Discounts => write_table(writer, &dataset.discounts),
        Table::Subscriptions => write_table(writer, &dataset.subscriptions),
        Table::SubscriptionDiscounts => write_table(writer, &dataset.subscription_discounts),
        Table::Invoices => write_table(writer, &dataset.invoices),
        Table::LineItems => write_table(writer, &dataset.line_items),
        Table::Payments => write_table(writer, &dataset.payments),
    }
}

/// Render one table to an in-memory CSV buffer.
pub fn table_to_bytes(dataset: &BillingDataset, table: Table) -> SimResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_dataset_table(&mut buffer, dataset, table)?;
    Ok(buffer)
}

/// Write every table to `<dir>/<table>.csv`, creating `dir` if needed.
pub fn export_csv(dataset: &BillingDataset, dir: &Path) -> SimResult<()> {
    fs::create_dir_all(dir)?;
    for table in Table::ALL {
        let path = dir.join(format!("{}.csv", table.name()));
        let file = fs::File::create(&path)?;
        write_dataset_table(file, dataset, table)?;
        log::info!(
            "export: wrote {} rows to {}",
            dataset.row_count(table),
            path.display()
        );
    }
    Ok(())
}
