//! The generation engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Customer generator
//!   2. Subscription lifecycle
//!   3. Discount attachment
//!   4. Billing cycles, invoices and payments
//!
//! RULES:
//!   - Each stage consumes only earlier stages' output plus the catalog.
//!   - Each stage owns its ID sequence for the duration of the stage.
//!   - All randomness flows through the RngBank.
//!   - Configuration is validated before any stage runs.

use crate::{
    billing::{BillingEngine, BillingSequences, Invoice, LineItem, Payment},
    catalog::{Catalog, Discount, Plan, Product},
    config::GeneratorConfig,
    customer::{Customer, CustomerGenerator, EmailRegistry},
    discount::{DiscountAttachment, SubscriptionDiscount},
    error::SimResult,
    ids::{IdSequences, Table, WatermarkResolver},
    lifecycle::{Subscription, SubscriptionLifecycle},
    rng::{RngBank, StageSlot},
};

/// The nine output tables of one run, each in generation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingDataset {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub plans: Vec<Plan>,
    pub discounts: Vec<Discount>,
    pub subscriptions: Vec<Subscription>,
    pub subscription_discounts: Vec<SubscriptionDiscount>,
    pub invoices: Vec<Invoice>,
    pub line_items: Vec<LineItem>,
    pub payments: Vec<Payment>,
}

impl BillingDataset {
    pub fn row_count(&self, table: Table) -> usize {
        match table {
            Table::Customers => self.customers.len(),
            Table::Products => self.products.len(),
            Table::Plans => self.plans.len(),
            Table::Discounts => self.discounts.len(),
            Table::Subscriptions => self.subscriptions.len(),
            Table::SubscriptionDiscounts => self.subscription_discounts.len(),
            Table::Invoices => self.invoices.len(),
            Table::LineItems => self.line_items.len(),
            Table::Payments => self.payments.len(),
        }
    }
}

pub struct GenerationEngine {
    config: GeneratorConfig,
    catalog: Catalog,
    rng_bank: RngBank,
    ids: IdSequences,
    emails: EmailRegistry,
}

impl GenerationEngine {
    /// Validate inputs, resolve ID sequences and seed the RNG bank.
    /// Fails fast with `InvalidConfig` before anything is generated.
    pub fn build(
        config: GeneratorConfig,
        catalog: Catalog,
        watermarks: Option<&dyn WatermarkResolver>,
    ) -> SimResult<Self> {
        config.validate()?;
        catalog.validate()?;
        let ids = IdSequences::resume(&config.id_bases, watermarks)?;
        Ok(Self {
            rng_bank: RngBank::new(config.seed),
            config,
            catalog,
            ids,
            emails: EmailRegistry::new(),
        })
    }

    /// Treat these emails as already issued (customers loaded by an
    /// earlier run), so new customers never collide with them.
    pub fn with_existing_emails<I: IntoIterator<Item = String>>(mut self, emails: I) -> Self {
        self.emails = EmailRegistry::with_existing(emails);
        self
    }

    /// Run all stages in the documented order.
    pub fn run(mut self) -> SimResult<BillingDataset> {
        log::info!(
            "engine: seed={} horizon={}..={} customers={}",
            self.rng_bank.master_seed(),
            self.config.horizon_start,
            self.config.horizon_end,
            self.config.customer_count
        );
        let ids = self.ids;

        let mut rng = self.rng_bank.for_stage(StageSlot::Customer);
        log::debug!("engine: running stage {}", rng.name);
        let (customers, customer_ids) = CustomerGenerator::new(&self.config).generate(
            ids.customer,
            &mut self.emails,
            &mut rng,
        );

        let mut rng = self.rng_bank.for_stage(StageSlot::Lifecycle);
        log::debug!("engine: running stage {}", rng.name);
        let (subscriptions, subscription_ids) = SubscriptionLifecycle::new(&self.config, &self.catalog)
            .generate(&customers, ids.subscription, &mut rng)?;

        let mut rng = self.rng_bank.for_stage(StageSlot::Discount);
        log::debug!("engine: running stage {}", rng.name);
        let (subscription_discounts, sub_discount_ids) = DiscountAttachment::new(&self.config, &self.catalog)
            .attach(&subscriptions, ids.subscription_discount, &mut rng)?;

        let mut rng = self.rng_bank.for_stage(StageSlot::Billing);
        log::debug!("engine: running stage {}", rng.name);
        let billing_ids = BillingSequences {
            invoice: ids.invoice,
            line_item: ids.line_item,
            payment: ids.payment,
        };
        let (billed, billing_ids) = BillingEngine::new(&self.config, &self.catalog).bill(
            &subscriptions,
            &subscription_discounts,
            billing_ids,
            &mut rng,
        )?;

        let next_ids = IdSequences {
            customer: customer_ids,
            subscription: subscription_ids,
            subscription_discount: sub_discount_ids,
            invoice: billing_ids.invoice,
            line_item: billing_ids.line_item,
            payment: billing_ids.payment,
        };
        log::debug!("engine: next ids after run {next_ids:?}");

        Ok(BillingDataset {
            customers,
            products: self.catalog.products,
            plans: self.catalog.plans,
            discounts: self.catalog.discounts,
            subscriptions,
            subscription_discounts,
            invoices: billed.invoices,
            line_items: billed.line_items,
            payments: billed.payments,
        })
    }
}
