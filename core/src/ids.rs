//! Monotonic ID sequences and the watermark seam.
//!
//! Each generated table owns an independent sequence. Sequences are
//! handed to a stage by value and returned with its output, so no
//! stage can observe or reuse another stage's counter.

use crate::{
    error::{SimError, SimResult},
    types::RowId,
};
use serde::{Deserialize, Serialize};

/// The tabular outputs of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Customers,
    Products,
    Plans,
    Discounts,
    Subscriptions,
    SubscriptionDiscounts,
    Invoices,
    LineItems,
    Payments,
}

impl Table {
    /// Output order: static catalog first, then generated tables
    /// parents before children.
    pub const ALL: [Table; 9] = [
        Table::Customers,
        Table::Products,
        Table::Plans,
        Table::Discounts,
        Table::Subscriptions,
        Table::SubscriptionDiscounts,
        Table::Invoices,
        Table::LineItems,
        Table::Payments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Plans => "plans",
            Self::Discounts => "discounts",
            Self::Subscriptions => "subscriptions",
            Self::SubscriptionDiscounts => "subscription_discounts",
            Self::Invoices => "invoices",
            Self::LineItems => "line_items",
            Self::Payments => "payments",
        }
    }

    /// Unique-key column for the table.
    pub fn id_column(&self) -> &'static str {
        match self {
            Self::Customers => "customer_id",
            Self::Products => "product_id",
            Self::Plans => "plan_id",
            Self::Discounts => "discount_id",
            Self::Subscriptions => "subscription_id",
            Self::SubscriptionDiscounts => "sub_discount_id",
            Self::Invoices => "invoice_id",
            Self::LineItems => "line_item_id",
            Self::Payments => "payment_id",
        }
    }

    /// Catalog tables are configuration, not generated rows.
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Products | Self::Plans | Self::Discounts)
    }

    pub fn from_name(name: &str) -> SimResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == name)
            .ok_or_else(|| SimError::UnknownTable { name: name.to_string() })
    }
}

/// A strictly increasing ID counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSequence {
    next: RowId,
}

impl IdSequence {
    pub fn starting_at(first: RowId) -> Self {
        Self { next: first }
    }

    /// Return the current value and advance.
    pub fn next_id(&mut self) -> RowId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The ID the next call to `next_id` will return.
    pub fn peek(&self) -> RowId {
        self.next
    }
}

/// First ID for each generated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdBases {
    #[serde(default = "one")]
    pub customer: RowId,
    #[serde(default = "one")]
    pub subscription: RowId,
    #[serde(default = "default_sub_discount_base")]
    pub subscription_discount: RowId,
    #[serde(default = "one")]
    pub invoice: RowId,
    #[serde(default = "one")]
    pub line_item: RowId,
    #[serde(default = "one")]
    pub payment: RowId,
}

fn one() -> RowId {
    1
}

fn default_sub_discount_base() -> RowId {
    401
}

impl Default for IdBases {
    fn default() -> Self {
        Self {
            customer: 1,
            subscription: 1,
            subscription_discount: default_sub_discount_base(),
            invoice: 1,
            line_item: 1,
            payment: 1,
        }
    }
}

impl IdBases {
    pub fn validate(&self) -> SimResult<()> {
        let bases = [
            ("customer", self.customer),
            ("subscription", self.subscription),
            ("subscription_discount", self.subscription_discount),
            ("invoice", self.invoice),
            ("line_item", self.line_item),
            ("payment", self.payment),
        ];
        if let Some((name, _)) = bases.iter().find(|(_, base)| *base == 0) {
            return Err(SimError::invalid_config(format!(
                "id base for {name} must be >= 1"
            )));
        }
        Ok(())
    }
}

/// Looks up the highest ID already assigned in a table, typically
/// from a store that received an earlier run's output.
pub trait WatermarkResolver {
    /// None (or Some(0)) when the table holds no rows yet.
    fn max_id(&self, table: Table) -> SimResult<Option<RowId>>;
}

/// One sequence per generated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSequences {
    pub customer: IdSequence,
    pub subscription: IdSequence,
    pub subscription_discount: IdSequence,
    pub invoice: IdSequence,
    pub line_item: IdSequence,
    pub payment: IdSequence,
}

impl IdSequences {
    pub fn from_bases(bases: &IdBases) -> Self {
        Self {
            customer: IdSequence::starting_at(bases.customer),
            subscription: IdSequence::starting_at(bases.subscription),
            subscription_discount: IdSequence::starting_at(bases.subscription_discount),
            invoice: IdSequence::starting_at(bases.invoice),
            line_item: IdSequence::starting_at(bases.line_item),
            payment: IdSequence::starting_at(bases.payment),
        }
    }

    /// Continue after a prior run: each sequence starts at the larger of
    /// its configured base and the table's watermark + 1.
    pub fn resume(bases: &IdBases, resolver: Option<&dyn WatermarkResolver>) -> SimResult<Self> {
        let Some(resolver) = resolver else {
            return Ok(Self::from_bases(bases));
        };
        let start = |table: Table, base: RowId| -> SimResult<IdSequence> {
            let watermark = resolver.max_id(table)?.unwrap_or(0);
            let first = base.max(watermark + 1);
            if first != base {
                log::info!("ids: {} resumes at {first} (watermark {watermark})", table.name());
            }
            Ok(IdSequence::starting_at(first))
        };
        Ok(Self {
            customer: start(Table::Customers, bases.customer)?,
            subscription: start(Table::Subscriptions, bases.subscription)?,
            subscription_discount: start(
                Table::SubscriptionDiscounts,
                bases.subscription_discount,
            )?,
            invoice: start(Table::Invoices, bases.invoice)?,
            line_item: start(Table::LineItems, bases.line_item)?,
            payment: start(Table::Payments, bases.payment)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedWatermarks(HashMap<Table, RowId>);

    impl WatermarkResolver for FixedWatermarks {
        fn max_id(&self, table: Table) -> SimResult<Option<RowId>> {
            Ok(self.0.get(&table).copied())
        }
    }

    #[test]
    fn sequence_is_strictly_increasing() {
        let mut seq = IdSequence::starting_at(401);
        assert_eq!(seq.next_id(), 401);
        assert_eq!(seq.next_id(), 402);
        assert_eq!(seq.peek(), 403);
    }

    #[test]
    fn no_resolver_uses_bases() {
        let bases = IdBases::default();
        let ids = IdSequences::resume(&bases, None).unwrap();
        assert_eq!(ids, IdSequences::from_bases(&bases));
        assert_eq!(ids.subscription_discount.peek(), 401);
    }

    #[test]
    fn watermark_moves_sequences_forward_only() {
        let watermarks = FixedWatermarks(
            [(Table::Invoices, 57), (Table::SubscriptionDiscounts, 12)].into(),
        );
        let ids = IdSequences::resume(&IdBases::default(), Some(&watermarks)).unwrap();
        assert_eq!(ids.invoice.peek(), 58);
        // Watermark below the configured base never rewinds the sequence.
        assert_eq!(ids.subscription_discount.peek(), 401);
        assert_eq!(ids.payment.peek(), 1);
    }

    #[test]
    fn table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(Table::from_name(table.name()).unwrap(), table);
        }
        assert!(Table::from_name("ledger").is_err());
    }

    #[test]
    fn zero_base_rejected() {
        let bases = IdBases { invoice: 0, ..IdBases::default() };
        assert!(bases.validate().is_err());
    }
}
