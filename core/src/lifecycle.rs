//! Subscription Lifecycle Engine.
//!
//! Per customer, not global:
//!   1. Pick a plan from the whole catalog and a start date in the horizon.
//!   2. Resolve the tenure: active, or cancelled after U(min, max) days
//!      (clamped to the horizon end).
//!   3. Roll the plan switch. A switch force-closes the first tenure on
//!      the switch date and opens a second tenure the same day on a
//!      tier-transition target of the same product.
//!
//! At most two subscriptions per customer. The first tenure stays
//! provisional until the switch decision is made; nothing is emitted
//! and later rewritten.

use crate::{
    catalog::{Catalog, Plan},
    config::GeneratorConfig,
    customer::Customer,
    error::{SimError, SimResult},
    ids::IdSequence,
    rng::StageRng,
    types::RowId,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: RowId,
    pub customer_id: RowId,
    pub plan_id: RowId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: SubscriptionStatus,
    pub cancel_date: Option<NaiveDate>,
}

impl Subscription {
    /// Last day the subscription can be billed, bounded by the horizon.
    pub fn billable_until(&self, horizon_end: NaiveDate) -> NaiveDate {
        self.end_date.map_or(horizon_end, |end| end.min(horizon_end))
    }
}

/// A plan tenure whose terminal state may still be overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProvisionalSubscription {
    plan_id: RowId,
    start_date: NaiveDate,
    /// Some(date) = cancelled on that date.
    end_date: Option<NaiveDate>,
}

impl ProvisionalSubscription {
    /// Force-close on `date`, overriding whatever was resolved.
    fn closed_on(self, date: NaiveDate) -> Self {
        Self { end_date: Some(date), ..self }
    }

    fn finalize(self, subscription_id: RowId, customer_id: RowId) -> Subscription {
        let status = match self.end_date {
            Some(_) => SubscriptionStatus::Cancelled,
            None => SubscriptionStatus::Active,
        };
        Subscription {
            subscription_id,
            customer_id,
            plan_id: self.plan_id,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            cancel_date: self.end_date,
        }
    }
}

pub struct SubscriptionLifecycle<'a> {
    config: &'a GeneratorConfig,
    catalog: &'a Catalog,
}

impl<'a> SubscriptionLifecycle<'a> {
    pub fn new(config: &'a GeneratorConfig, catalog: &'a Catalog) -> Self {
        Self { config, catalog }
    }

    /// Build every customer's timeline in customer order.
    pub fn generate(
        &self,
        customers: &[Customer],
        mut ids: IdSequence,
        rng: &mut StageRng,
    ) -> SimResult<(Vec<Subscription>, IdSequence)> {
        let mut subscriptions = Vec::with_capacity(customers.len() * 2);
        let mut switches = 0usize;
        for customer in customers {
            let timeline = self.customer_timeline(customer.customer_id, &mut ids, rng)?;
            if timeline.len() > 1 {
                switches += 1;
            }
            subscriptions.extend(timeline);
        }
        log::info!(
            "lifecycle: {} subscriptions for {} customers ({switches} plan switches)",
            subscriptions.len(),
            customers.len()
        );
        Ok((subscriptions, ids))
    }

    /// Draw order: plan, start offset, status, [end offset], switch roll,
    /// [switch offset, target plan, status, [end offset]].
    fn customer_timeline(
        &self,
        customer_id: RowId,
        ids: &mut IdSequence,
        rng: &mut StageRng,
    ) -> SimResult<Vec<Subscription>> {
        let plan = rng
            .pick(&self.catalog.plans)
            .ok_or_else(|| SimError::invalid_config("catalog has no plans"))?;
        let start_offset = rng.between_inclusive(0, self.config.horizon_days());
        let start_date = self.config.horizon_start + Duration::days(start_offset);
        let initial = self.resolve_tenure(plan.plan_id, start_date, rng);

        if !rng.chance(self.config.upgrade_probability) {
            return Ok(vec![initial.finalize(ids.next_id(), customer_id)]);
        }

        let candidates = self.catalog.switch_candidates(plan);
        if candidates.is_empty() {
            log::warn!(
                "lifecycle: customer {customer_id} has no switch target from plan {} ({})",
                plan.plan_id,
                plan.plan_name.as_str()
            );
            return Ok(vec![initial.finalize(ids.next_id(), customer_id)]);
        }

        let switch_date = self.tenure_end(start_date, rng);
        let target: &Plan = rng
            .pick(&candidates)
            .copied()
            .ok_or(SimError::UnknownPlan { plan_id: plan.plan_id })?;
        log::debug!(
            "lifecycle: customer {customer_id} switches {} -> {} on {switch_date}",
            plan.plan_id,
            target.plan_id
        );

        let first = initial.closed_on(switch_date);
        let second = self.resolve_tenure(target.plan_id, switch_date, rng);
        Ok(vec![
            first.finalize(ids.next_id(), customer_id),
            second.finalize(ids.next_id(), customer_id),
        ])
    }

    fn resolve_tenure(
        &self,
        plan_id: RowId,
        start_date: NaiveDate,
        rng: &mut StageRng,
    ) -> ProvisionalSubscription {
        let end_date = if rng.chance(self.config.cancel_probability) {
            Some(self.tenure_end(start_date, rng))
        } else {
            None
        };
        ProvisionalSubscription { plan_id, start_date, end_date }
    }

    /// `from` + U(tenure_days_min, tenure_days_max), never past the horizon.
    fn tenure_end(&self, from: NaiveDate, rng: &mut StageRng) -> NaiveDate {
        let horizon_end = self.config.horizon_end;
        let days = rng.between_inclusive(self.config.tenure_days_min, self.config.tenure_days_max);
        Duration::try_days(days)
            .and_then(|span| from.checked_add_signed(span))
            .map_or(horizon_end, |end| end.min(horizon_end))
    }
}
