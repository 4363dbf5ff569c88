//! Billing Cycle & Invoice Engine.
//!
//! Walks each subscription in fixed-length cycles (not calendar
//! months). Every cycle whose invoice date is on or before the
//! subscription's last billable day yields one invoice with:
//!   - one charge line for the plan price (recorded even at zero),
//!   - one discount line per eligible attached discount,
//!   - exactly one payment attempt the day after the invoice.
//!
//! total_due is the plain sum of the lines and is NOT clamped at zero:
//! a fixed discount larger than the charge yields a negative total.

use crate::{
    catalog::{BillingFrequency, Catalog, Discount, DiscountType, Plan},
    config::GeneratorConfig,
    customer::PaymentMethod,
    discount::SubscriptionDiscount,
    error::SimResult,
    ids::IdSequence,
    lifecycle::Subscription,
    rng::StageRng,
    types::{Money, RowId},
};
use chrono::{Duration, NaiveDate};
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    Pending,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    Charge,
    Discount,
}

impl LineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Charge => "charge",
            LineType::Discount => "discount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: RowId,
    pub subscription_id: RowId,
    pub invoice_date: NaiveDate,
    pub total_due: Money,
    pub invoice_status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub line_item_id: RowId,
    pub invoice_id: RowId,
    /// None for discount lines.
    pub plan_id: Option<RowId>,
    pub description: String,
    pub amount: Money,
    pub line_type: LineType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: RowId,
    pub invoice_id: RowId,
    pub payment_date: NaiveDate,
    pub amount_paid: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
}

/// The three independent sequences the billing stage consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingSequences {
    pub invoice: IdSequence,
    pub line_item: IdSequence,
    pub payment: IdSequence,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingOutput {
    pub invoices: Vec<Invoice>,
    pub line_items: Vec<LineItem>,
    pub payments: Vec<Payment>,
}

/// Enumerate (cycle_number, invoice_date) from `start` every
/// `cycle_days`, stopping before the first date past `last_billable`
/// or the first date chrono cannot represent.
pub fn billing_dates(
    start: NaiveDate,
    last_billable: NaiveDate,
    cycle_days: i64,
) -> impl Iterator<Item = (u32, NaiveDate)> {
    (0u32..)
        .map_while(move |cycle| {
            let offset = i64::from(cycle)
                .checked_mul(cycle_days)
                .and_then(Duration::try_days)?;
            Some((cycle, start.checked_add_signed(offset)?))
        })
        .take_while(move |(_, date)| *date <= last_billable)
}

/// Signed amount of a discount line: always <= 0.
pub fn discount_amount(discount: &Discount, plan_price: Money) -> Money {
    let off = match discount.discount_type {
        DiscountType::Percent => (plan_price * discount.discount_value / Money::from(100))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        DiscountType::Fixed => discount.discount_value,
    };
    if off.is_zero() {
        Money::ZERO
    } else {
        -off
    }
}

pub struct BillingEngine<'a> {
    config: &'a GeneratorConfig,
    catalog: &'a Catalog,
}

impl<'a> BillingEngine<'a> {
    pub fn new(config: &'a GeneratorConfig, catalog: &'a Catalog) -> Self {
        Self { config, catalog }
    }

    pub fn cycle_days(&self, plan: &Plan) -> i64 {
        match plan.recurring {
            BillingFrequency::Monthly => self.config.monthly_cycle_days,
            BillingFrequency::Yearly => self.config.yearly_cycle_days,
        }
    }

    /// Bill every subscription in order.
    pub fn bill(
        &self,
        subscriptions: &[Subscription],
        subscription_discounts: &[SubscriptionDiscount],
        mut ids: BillingSequences,
        rng: &mut StageRng,
    ) -> SimResult<(BillingOutput, BillingSequences)> {
        let mut by_subscription: BTreeMap<RowId, Vec<&SubscriptionDiscount>> = BTreeMap::new();
        for sd in subscription_discounts {
            by_subscription.entry(sd.subscription_id).or_default().push(sd);
        }

        let mut out = BillingOutput::default();
        for subscription in subscriptions {
            let attached = by_subscription
                .get(&subscription.subscription_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            self.bill_subscription(subscription, attached, &mut ids, rng, &mut out)?;
        }

        let paid = out
            .invoices
            .iter()
            .filter(|i| i.invoice_status == InvoiceStatus::Paid)
            .count();
        log::info!(
            "billing: {} invoices ({paid} paid, {} pending), {} line items, {} payments",
            out.invoices.len(),
            out.invoices.len() - paid,
            out.line_items.len(),
            out.payments.len()
        );
        Ok((out, ids))
    }

    fn bill_subscription(
        &self,
        subscription: &Subscription,
        attached: &[&SubscriptionDiscount],
        ids: &mut BillingSequences,
        rng: &mut StageRng,
        out: &mut BillingOutput,
    ) -> SimResult<()> {
        let plan = self.catalog.plan(subscription.plan_id)?;
        let horizon_end = self.config.horizon_end;
        let last_billable = subscription.billable_until(horizon_end);

        for (cycle, invoice_date) in
            billing_dates(subscription.start_date, last_billable, self.cycle_days(plan))
        {
            let invoice_id = ids.invoice.next_id();

            let mut lines = vec![LineItem {
                line_item_id: ids.line_item.next_id(),
                invoice_id,
                plan_id: Some(plan.plan_id),
                description: format!(
                    "{} plan - {} charge",
                    plan.plan_name.as_str(),
                    plan.recurring.as_str()
                ),
                amount: plan.plan_price,
                line_type: LineType::Charge,
            }];

            for sd in attached {
                let Some(discount) = self.catalog.discount(sd.discount_id) else {
                    log::warn!(
                        "billing: subscription discount {} references unknown discount {}",
                        sd.sub_discount_id,
                        sd.discount_id
                    );
                    continue;
                };
                if !applies(discount, sd, plan, cycle, invoice_date, horizon_end) {
                    continue;
                }
                lines.push(LineItem {
                    line_item_id: ids.line_item.next_id(),
                    invoice_id,
                    plan_id: None,
                    description: discount_description(discount),
                    amount: discount_amount(discount, plan.plan_price),
                    line_type: LineType::Discount,
                });
            }

            let total_due: Money = lines.iter().map(|l| l.amount).sum();
            let payment = self.attempt_payment(plan, invoice_id, invoice_date, total_due, ids, rng);
            let invoice_status = match payment.payment_status {
                PaymentStatus::Success => InvoiceStatus::Paid,
                PaymentStatus::Failed => InvoiceStatus::Pending,
            };

            out.invoices.push(Invoice {
                invoice_id,
                subscription_id: subscription.subscription_id,
                invoice_date,
                total_due,
                invoice_status,
            });
            out.line_items.extend(lines);
            out.payments.push(payment);
        }
        Ok(())
    }

    /// Free plans settle with a synthetic zero payment. Otherwise draw
    /// success, then a method independent of the customer's preference.
    fn attempt_payment(
        &self,
        plan: &Plan,
        invoice_id: RowId,
        invoice_date: NaiveDate,
        total_due: Money,
        ids: &mut BillingSequences,
        rng: &mut StageRng,
    ) -> Payment {
        let payment_date = invoice_date + Duration::days(1);
        if plan.is_free() {
            return Payment {
                payment_id: ids.payment.next_id(),
                invoice_id,
                payment_date,
                amount_paid: Money::ZERO,
                payment_status: PaymentStatus::Success,
                payment_method: PaymentMethod::NotApplicable,
            };
        }

        let succeeded = rng.chance(self.config.payment_success_probability);
        let payment_method = rng
            .pick(&PaymentMethod::BILLABLE)
            .copied()
            .unwrap_or(PaymentMethod::Credit);
        let (amount_paid, payment_status) = if succeeded {
            (total_due, PaymentStatus::Success)
        } else {
            (Money::ZERO, PaymentStatus::Failed)
        };
        Payment {
            payment_id: ids.payment.next_id(),
            invoice_id,
            payment_date,
            amount_paid,
            payment_status,
            payment_method,
        }
    }
}

/// Invoice-time eligibility of an attached discount.
fn applies(
    discount: &Discount,
    attached: &SubscriptionDiscount,
    plan: &Plan,
    cycle: u32,
    invoice_date: NaiveDate,
    horizon_end: NaiveDate,
) -> bool {
    attached.covers(invoice_date, horizon_end)
        && discount.is_in_scope(plan)
        && (discount.is_recurring || cycle == 0)
}

fn discount_description(discount: &Discount) -> String {
    match discount.discount_type {
        DiscountType::Percent => format!(
            "Discount {} ({}% off)",
            discount.discount_code,
            discount.discount_value.normalize()
        ),
        DiscountType::Fixed => format!(
            "Discount {} ({} off)",
            discount.discount_code,
            discount.discount_value.normalize()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn billing_dates_step_by_cycle_and_include_last_day() {
        let start = date(2024, 1, 1);
        let dates: Vec<_> = billing_dates(start, date(2024, 3, 1), 30).collect();
        assert_eq!(
            dates,
            vec![(0, date(2024, 1, 1)), (1, date(2024, 1, 31)), (2, date(2024, 3, 1))]
        );
    }

    #[test]
    fn billing_dates_single_cycle_when_start_is_last_day() {
        let start = date(2024, 6, 1);
        let dates: Vec<_> = billing_dates(start, start, 365).collect();
        assert_eq!(dates, vec![(0, start)]);
    }

    #[test]
    fn percent_discount_rounds_to_cents() {
        let catalog = Catalog::default_test();
        let mut d = catalog.discounts[0].clone();
        assert_eq!(discount_amount(&d, dec!(100)), dec!(-20.00));

        d.discount_value = dec!(33.333);
        assert_eq!(discount_amount(&d, dec!(50)), dec!(-16.67));
    }

    #[test]
    fn fixed_discount_can_exceed_charge() {
        let catalog = Catalog::default_test();
        let mut d = catalog.discounts[0].clone();
        d.discount_type = DiscountType::Fixed;
        d.discount_value = dec!(150);
        assert_eq!(discount_amount(&d, dec!(100)), dec!(-150));
    }

    #[test]
    fn zero_discount_is_not_negative_zero() {
        let catalog = Catalog::default_test();
        let d = &catalog.discounts[0];
        let amount = discount_amount(d, Money::ZERO);
        assert!(amount.is_zero());
        assert!(!amount.is_sign_negative());
    }

    #[test]
    fn one_time_discount_only_on_first_cycle() {
        let catalog = Catalog::default_test();
        let d = &catalog.discounts[0];
        let plan = catalog.plan(102).unwrap();
        let sd = SubscriptionDiscount {
            sub_discount_id: 401,
            subscription_id: 1,
            discount_id: d.discount_id,
            applied_date: date(2024, 1, 1),
            expiry_date: None,
        };
        let horizon_end = date(2024, 12, 31);
        assert!(applies(d, &sd, plan, 0, date(2024, 1, 1), horizon_end));
        assert!(!applies(d, &sd, plan, 1, date(2024, 1, 31), horizon_end));

        let mut recurring = d.clone();
        recurring.is_recurring = true;
        assert!(applies(&recurring, &sd, plan, 5, date(2024, 5, 30), horizon_end));
    }

    #[test]
    fn out_of_scope_discount_never_applies() {
        let catalog = Catalog::default_test();
        let mut d = catalog.discounts[0].clone();
        d.product_id = Some(3);
        let plan = catalog.plan(102).unwrap();
        let sd = SubscriptionDiscount {
            sub_discount_id: 401,
            subscription_id: 1,
            discount_id: d.discount_id,
            applied_date: date(2024, 1, 1),
            expiry_date: None,
        };
        assert!(!applies(&d, &sd, plan, 0, date(2024, 1, 1), date(2024, 12, 31)));
    }

    #[test]
    fn billing_dates_stop_at_unrepresentable_dates() {
        let start = date(2024, 1, 1);
        let dates: Vec<_> = billing_dates(start, NaiveDate::MAX, 4_000_000_000).collect();
        assert_eq!(dates, vec![(0, start)]);
        assert_eq!(billing_dates(start, NaiveDate::MAX, i64::MAX).count(), 1);
    }
}
