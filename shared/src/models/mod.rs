//! Domain models for the workshop stock ledger

mod spare_part;
mod stock;
mod warehouse;

pub use spare_part::*;
pub use stock::*;
pub use warehouse::*;
