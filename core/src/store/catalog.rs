use super::DatasetStore;
use crate::{
    catalog::{Discount, Plan, Product},
    error::SimResult,
};
use rusqlite::params;

impl DatasetStore {
    // ── Catalog ───────────────────────────────────────────────────
    // Static rows: re-loading the same catalog is a no-op.

    pub(crate) fn insert_products(&self, products: &[Product]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO products (product_id, product_name, product_description)
             VALUES (?1, ?2, ?3)",
        )?;
        for p in products {
            stmt.execute(params![p.product_id as i64, p.product_name, p.product_description])?;
        }
        Ok(())
    }

    pub(crate) fn insert_plans(&self, plans: &[Plan]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO plans (plan_id, product_id, plan_name, plan_price, recurring)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for p in plans {
            stmt.execute(params![
                p.plan_id as i64,
                p.product_id as i64,
                p.plan_name.as_str(),
                p.plan_price.to_string(),
                p.recurring.as_str(),
            ])?;
        }
        Ok(())
    }

    pub(crate) fn insert_discounts(&self, discounts: &[Discount]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO discounts (
                discount_id, discount_code, discount_type, discount_value,
                valid_from, valid_to, product_id, plan_id, is_recurring
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for d in discounts {
            stmt.execute(params![
                d.discount_id as i64,
                d.discount_code,
                d.discount_type.as_str(),
                d.discount_value.to_string(),
                d.valid_from.to_string(),
                d.valid_to.to_string(),
                d.product_id.map(|id| id as i64),
                d.plan_id.map(|id| id as i64),
                d.is_recurring,
            ])?;
        }
        Ok(())
    }
}
