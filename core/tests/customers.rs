//! Customer generator tests.

use billsim_core::{
    catalog::Catalog,
    config::GeneratorConfig,
    customer::PaymentMethod,
    engine::{BillingDataset, GenerationEngine},
};
use std::collections::HashSet;

fn generate(customers: usize, seed: u64) -> BillingDataset {
    let config = GeneratorConfig {
        customer_count: customers,
        seed,
        ..GeneratorConfig::default_test()
    };
    GenerationEngine::build(config, Catalog::default_test(), None)
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn generates_requested_number_of_customers() {
    let dataset = generate(37, 42);
    assert_eq!(dataset.customers.len(), 37);
    let ids: Vec<u64> = dataset.customers.iter().map(|c| c.customer_id).collect();
    assert_eq!(ids, (1..=37).collect::<Vec<u64>>());
}

#[test]
fn emails_are_pairwise_distinct() {
    // Small name lists force plenty of collisions at this size.
    let dataset = generate(2_000, 7);
    let emails: HashSet<&str> = dataset
        .customers
        .iter()
        .map(|c| c.customer_email.as_str())
        .collect();
    assert_eq!(emails.len(), dataset.customers.len(), "duplicate emails generated");
}

#[test]
fn emails_derive_from_names() {
    let dataset = generate(200, 11);
    for c in &dataset.customers {
        let (local, domain) = c.customer_email.split_once('@').unwrap();
        assert_eq!(domain, "srcanalytics.com");
        let stripped: String = c
            .customer_name
            .to_lowercase()
            .chars()
            .filter(|ch| ch.is_ascii_lowercase())
            .collect();
        let suffix = local
            .strip_prefix(stripped.as_str())
            .unwrap_or_else(|| panic!("{} does not start with {stripped}", c.customer_email));
        assert!(
            suffix.chars().all(|ch| ch.is_ascii_digit()),
            "unexpected suffix in {}",
            c.customer_email
        );
    }
}

#[test]
fn payment_methods_follow_configured_mix() {
    let dataset = generate(3_000, 99);
    let n = dataset.customers.len() as f64;
    let share = |m: PaymentMethod| {
        dataset.customers.iter().filter(|c| c.payment_method == m).count() as f64 / n
    };

    assert_eq!(share(PaymentMethod::NotApplicable), 0.0);
    assert!((share(PaymentMethod::Credit) - 0.5).abs() < 0.05, "credit share off");
    assert!((share(PaymentMethod::Debit) - 0.3).abs() < 0.05, "debit share off");
    assert!((share(PaymentMethod::Paypal) - 0.2).abs() < 0.05, "paypal share off");
}

#[test]
fn addresses_are_single_line() {
    let dataset = generate(50, 3);
    for c in &dataset.customers {
        assert!(!c.customer_address.is_empty());
        assert!(!c.customer_address.contains('\n'));
    }
}

#[test]
fn catalog_is_passed_through_unchanged() {
    let dataset = generate(5, 1);
    let catalog = Catalog::default_test();
    assert_eq!(dataset.products, catalog.products);
    assert_eq!(dataset.plans, catalog.plans);
    assert_eq!(dataset.discounts, catalog.discounts);
}
