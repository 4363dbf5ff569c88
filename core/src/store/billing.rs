use super::DatasetStore;
use crate::{
    billing::{Invoice, LineItem, Payment},
    discount::SubscriptionDiscount,
    error::SimResult,
    lifecycle::Subscription,
};
use rusqlite::params;

impl DatasetStore {
    // ── Subscriptions ─────────────────────────────────────────────

    pub(crate) fn insert_subscriptions(&self, subscriptions: &[Subscription]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO subscriptions (
                subscription_id, customer_id, plan_id, start_date, end_date, status, cancel_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for s in subscriptions {
            stmt.execute(params![
                s.subscription_id as i64,
                s.customer_id as i64,
                s.plan_id as i64,
                s.start_date.to_string(),
                s.end_date.map(|d| d.to_string()),
                s.status.as_str(),
                s.cancel_date.map(|d| d.to_string()),
            ])?;
        }
        Ok(())
    }

    pub(crate) fn insert_subscription_discounts(
        &self,
        rows: &[SubscriptionDiscount],
    ) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO subscription_discounts (
                sub_discount_id, subscription_id, discount_id, applied_date, expiry_date
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for sd in rows {
            stmt.execute(params![
                sd.sub_discount_id as i64,
                sd.subscription_id as i64,
                sd.discount_id as i64,
                sd.applied_date.to_string(),
                sd.expiry_date.map(|d| d.to_string()),
            ])?;
        }
        Ok(())
    }

    // ── Invoices, line items, payments ────────────────────────────

    pub(crate) fn insert_invoices(&self, invoices: &[Invoice]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO invoices (
                invoice_id, subscription_id, invoice_date, total_due, invoice_status
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for i in invoices {
            stmt.execute(params![
                i.invoice_id as i64,
                i.subscription_id as i64,
                i.invoice_date.to_string(),
                i.total_due.to_string(),
                i.invoice_status.as_str(),
            ])?;
        }
        Ok(())
    }

    pub(crate) fn insert_line_items(&self, line_items: &[LineItem]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO line_items (
                line_item_id, invoice_id, plan_id, description, amount, line_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for l in line_items {
            stmt.execute(params![
                l.line_item_id as i64,
                l.invoice_id as i64,
                l.plan_id.map(|id| id as i64),
                l.description,
                l.amount.to_string(),
                l.line_type.as_str(),
            ])?;
        }
        Ok(())
    }

    pub(crate) fn insert_payments(&self, payments: &[Payment]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO payments (
                payment_id, invoice_id, payment_date, amount_paid, payment_status, payment_method
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for p in payments {
            stmt.execute(params![
                p.payment_id as i64,
                p.invoice_id as i64,
                p.payment_date.to_string(),
                p.amount_paid.to_string(),
                p.payment_status.as_str(),
                p.payment_method.as_str(),
            ])?;
        }
        Ok(())
    }

    /// Invoice count by status, e.g. ("paid", 12).
    pub fn invoice_status_counts(&self) -> SimResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT invoice_status, COUNT(*) FROM invoices
             GROUP BY invoice_status ORDER BY invoice_status ASC",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
