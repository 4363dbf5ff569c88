//! Customer Generator: a fixed-size population with unique emails.

use crate::{
    config::{GeneratorConfig, RegionPool},
    ids::IdSequence,
    name_generator::NameGenerator,
    rng::StageRng,
    types::RowId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Credit,
    Debit,
    Paypal,
    /// Used only for the synthetic payments of free-plan invoices.
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl PaymentMethod {
    /// Methods a paying invoice may be settled with.
    pub const BILLABLE: [PaymentMethod; 3] =
        [PaymentMethod::Debit, PaymentMethod::Credit, PaymentMethod::Paypal];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Credit => "Credit",
            PaymentMethod::Debit => "Debit",
            PaymentMethod::Paypal => "Paypal",
            PaymentMethod::NotApplicable => "N/A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: RowId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_address: String,
    pub payment_method: PaymentMethod,
}

/// Tracks issued emails and resolves collisions with a numeric suffix.
#[derive(Debug, Default)]
pub struct EmailRegistry {
    seen: HashSet<String>,
}

impl EmailRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed with emails issued by earlier runs.
    pub fn with_existing<I: IntoIterator<Item = String>>(emails: I) -> Self {
        Self { seen: emails.into_iter().collect() }
    }

    /// `base@domain`, then `base1@domain`, `base2@domain`, ...
    /// where base is the lower-cased name with everything outside
    /// a-z removed.
    pub fn issue(&mut self, name: &str, domain: &str) -> String {
        let mut base: String = name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase())
            .collect();
        if base.is_empty() {
            base.push_str("customer");
        }

        let mut email = format!("{base}@{domain}");
        let mut counter = 1u64;
        while self.seen.contains(&email) {
            email = format!("{base}{counter}@{domain}");
            counter += 1;
        }
        self.seen.insert(email.clone());
        email
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

pub struct CustomerGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> CustomerGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate `config.customer_count` customers. Draw order per
    /// customer: name, region, address, payment method.
    pub fn generate(
        &self,
        mut ids: IdSequence,
        emails: &mut EmailRegistry,
        rng: &mut StageRng,
    ) -> (Vec<Customer>, IdSequence) {
        let n = self.config.customer_count;
        let domain = self.config.email_domain.as_str();
        let regions: Vec<(&RegionPool, f64)> =
            self.config.regions.iter().map(|r| (r, r.weight)).collect();

        let mut customers = Vec::with_capacity(n);
        for _ in 0..n {
            let customer_name = NameGenerator::generate_full_name(rng);
            let customer_address = match rng.pick_weighted(&regions) {
                Some(region) => NameGenerator::generate_address(rng, region),
                None => String::new(),
            };
            let payment_method = rng
                .pick_weighted(&self.config.customer_payment_mix)
                .copied()
                .unwrap_or(PaymentMethod::Credit);

            customers.push(Customer {
                customer_id: ids.next_id(),
                customer_email: emails.issue(&customer_name, domain),
                customer_name,
                customer_address,
                payment_method,
            });
        }
        log::info!("customer: generated {} customers", customers.len());
        (customers, ids)
    }
}
