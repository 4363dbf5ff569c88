//! Shared primitive types used across the entire generator.

use rust_decimal::Decimal;

/// A row identifier. Every table keys its rows with a monotonically
/// increasing integer that is unique within the table.
pub type RowId = u64;

/// Monetary amounts: plan prices, line items, invoice totals, payments.
pub type Money = Decimal;

/// A seed for the master RNG.
pub type Seed = u64;
