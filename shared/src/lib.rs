//! Shared types and ledger rules for the workshop stock ledger
//!
//! This crate contains the models and stock movement rules shared between the
//! backend, the transaction form (via WASM), and the tests.

pub mod ledger;
pub mod models;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use validation::*;
