//! Domain models for the workshop stock ledger server
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
