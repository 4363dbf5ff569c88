//! SQLite persistence layer: the dataset sink and the ID watermark source.
//!
//! RULE: Only store/ talks to the database.
//! Generation stages never touch the store; the runner hands it a
//! finished dataset.

mod billing;
mod catalog;
mod customer;

use crate::{
    engine::BillingDataset,
    error::SimResult,
    ids::{Table, WatermarkResolver},
    types::{RowId, Seed},
};
use rusqlite::{params, Connection};
use std::time::Instant;

pub struct DatasetStore {
    conn: Connection,
}

impl DatasetStore {
    /// Open (or create) the dataset database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_dataset.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: Seed,
        version: &str,
        started_at: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, started_at],
        )?;
        Ok(())
    }

    pub fn run_count(&self) -> SimResult<i64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM run", [], |r| r.get(0))?;
        Ok(n)
    }

    // ── Dataset ────────────────────────────────────────────────

    /// Insert every table in one transaction. Catalog rows already
    /// present are kept; a generated row whose ID already exists fails
    /// the whole load, which is rolled back and not retried.
    pub fn load_dataset(&self, dataset: &BillingDataset) -> SimResult<()> {
        let started = Instant::now();
        let tx = self.conn.unchecked_transaction()?;

        self.insert_products(&dataset.products)?;
        self.insert_plans(&dataset.plans)?;
        self.insert_discounts(&dataset.discounts)?;
        self.insert_customers(&dataset.customers)?;
        self.insert_subscriptions(&dataset.subscriptions)?;
        self.insert_subscription_discounts(&dataset.subscription_discounts)?;
        self.insert_invoices(&dataset.invoices)?;
        self.insert_line_items(&dataset.line_items)?;
        self.insert_payments(&dataset.payments)?;

        tx.commit()?;
        let rows: usize = Table::ALL.iter().map(|t| dataset.row_count(*t)).sum();
        log::info!(
            "store: loaded {rows} rows across {} tables in {:.2} sec",
            Table::ALL.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    pub fn row_count(&self, table: Table) -> SimResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n)
    }
}

impl WatermarkResolver for DatasetStore {
    fn max_id(&self, table: Table) -> SimResult<Option<RowId>> {
        let sql = format!(
            "SELECT COALESCE(MAX({}), 0) FROM {}",
            table.id_column(),
            table.name()
        );
        let max: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok((max > 0).then_some(max as RowId))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_no_watermarks() {
        let store = DatasetStore::in_memory().unwrap();
        store.migrate().unwrap();
        for table in Table::ALL {
            assert_eq!(store.max_id(table).unwrap(), None, "{}", table.name());
            assert_eq!(store.row_count(table).unwrap(), 0);
        }
    }

    #[test]
    fn migrate_is_idempotent() {
        let store = DatasetStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.migrate().unwrap();
        store.insert_run("r-1", 44, "0.1.0-test", "2024-01-01T00:00:00Z").unwrap();
        assert_eq!(store.run_count().unwrap(), 1);
    }
}
