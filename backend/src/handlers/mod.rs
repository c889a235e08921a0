//! HTTP handlers for the workshop stock ledger API

pub mod health;
pub mod spare_part;
pub mod stock;
pub mod warehouse;

pub use health::health_check;
pub use spare_part::{create_spare_part, get_spare_part, list_spare_parts, update_spare_part};
pub use stock::{apply_transaction, get_balance, list_transactions};
pub use warehouse::{
    create_warehouse, get_main_warehouse, get_warehouse, get_warehouse_history,
    get_warehouse_stock, list_warehouses,
};
