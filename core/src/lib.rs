//! Synthetic SaaS billing dataset generator.
//!
//! Turns a static product / plan / discount catalog into customers,
//! subscription histories, discounts, invoices, line items and
//! payments. Output is fully determined by the configuration (seed
//! included) and the starting ID sequences.

pub mod billing;
pub mod catalog;
pub mod config;
pub mod customer;
pub mod discount;
pub mod engine;
pub mod error;
pub mod export;
pub mod ids;
pub mod lifecycle;
pub mod name_generator;
pub mod rng;
pub mod store;
pub mod types;
