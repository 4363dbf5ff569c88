use super::DatasetStore;
use crate::{customer::Customer, error::SimResult};
use rusqlite::params;

impl DatasetStore {
    // ── Customer ──────────────────────────────────────────────────

    pub(crate) fn insert_customers(&self, customers: &[Customer]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO customers (
                customer_id, customer_name, customer_email, customer_address, payment_method
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for c in customers {
            stmt.execute(params![
                c.customer_id as i64,
                c.customer_name,
                c.customer_email,
                c.customer_address,
                c.payment_method.as_str(),
            ])?;
        }
        Ok(())
    }

    /// Every email already issued, for seeding the next run's registry.
    pub fn customer_emails(&self) -> SimResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT customer_email FROM customers ORDER BY customer_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
