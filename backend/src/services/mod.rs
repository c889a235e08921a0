//! Business logic services for the workshop stock ledger

pub mod spare_part;
pub mod stock;
pub mod warehouse;

pub use spare_part::SparePartService;
pub use stock::StockService;
pub use warehouse::WarehouseService;
