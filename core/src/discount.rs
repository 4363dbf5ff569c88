//! Discount Attachment Engine.
//!
//! Samples a share of subscriptions and attaches one catalog discount
//! to each sampled, non-free subscription. Attachment is catalog-wide:
//! product/plan scope is only checked when invoices are built, so a
//! discount scoped to another product can be attached and never apply.

use crate::{
    catalog::Catalog,
    config::GeneratorConfig,
    error::SimResult,
    ids::IdSequence,
    lifecycle::Subscription,
    rng::StageRng,
    types::RowId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDiscount {
    pub sub_discount_id: RowId,
    pub subscription_id: RowId,
    pub discount_id: RowId,
    pub applied_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
}

impl SubscriptionDiscount {
    /// Whether `date` falls in [applied_date, expiry_date or horizon_end].
    pub fn covers(&self, date: NaiveDate, horizon_end: NaiveDate) -> bool {
        let until = self.expiry_date.unwrap_or(horizon_end);
        self.applied_date <= date && date <= until
    }
}

pub struct DiscountAttachment<'a> {
    config: &'a GeneratorConfig,
    catalog: &'a Catalog,
}

impl<'a> DiscountAttachment<'a> {
    pub fn new(config: &'a GeneratorConfig, catalog: &'a Catalog) -> Self {
        Self { config, catalog }
    }

    /// Candidates are processed in subscription order, so IDs follow
    /// subscription order. Draw order: the candidate sample, then one
    /// discount pick per non-free candidate.
    pub fn attach(
        &self,
        subscriptions: &[Subscription],
        mut ids: IdSequence,
        rng: &mut StageRng,
    ) -> SimResult<(Vec<SubscriptionDiscount>, IdSequence)> {
        let candidate_count =
            (subscriptions.len() as f64 * self.config.discount_attach_fraction).round() as usize;
        let candidates = rng.sample_indices(subscriptions.len(), candidate_count);

        let mut attached = Vec::with_capacity(candidates.len());
        let mut skipped_free = 0usize;
        for index in candidates {
            let subscription = &subscriptions[index];
            let plan = self.catalog.plan(subscription.plan_id)?;
            if plan.is_free() {
                skipped_free += 1;
                continue;
            }
            let Some(discount) = rng.pick(&self.catalog.discounts) else {
                // Empty discount catalog: nothing to attach.
                break;
            };
            attached.push(SubscriptionDiscount {
                sub_discount_id: ids.next_id(),
                subscription_id: subscription.subscription_id,
                discount_id: discount.discount_id,
                applied_date: subscription.start_date,
                expiry_date: subscription.end_date,
            });
        }
        log::info!(
            "discount: attached {} discounts ({} candidates on free plans skipped)",
            attached.len(),
            skipped_free
        );
        Ok((attached, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_discount_runs_to_horizon() {
        let d = SubscriptionDiscount {
            sub_discount_id: 401,
            subscription_id: 1,
            discount_id: 1,
            applied_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            expiry_date: None,
        };
        let horizon_end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(d.covers(d.applied_date, horizon_end));
        assert!(d.covers(horizon_end, horizon_end));
        assert!(!d.covers(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(), horizon_end));
        assert!(!d.covers(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), horizon_end));
    }
}
