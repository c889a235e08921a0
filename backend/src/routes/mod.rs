//! Route definitions for the workshop stock ledger API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/spare-parts", spare_part_routes())
        .nest("/warehouses", warehouse_routes())
        .nest("/stock", stock_routes())
}

/// Spare part catalog routes
fn spare_part_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_spare_parts).post(handlers::create_spare_part))
        .route(
            "/:spare_part_id",
            get(handlers::get_spare_part).put(handlers::update_spare_part),
        )
}

/// Warehouse routes, including the warehouse detail page queries
fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_warehouses).post(handlers::create_warehouse))
        .route("/main", get(handlers::get_main_warehouse))
        .route("/:warehouse_id", get(handlers::get_warehouse))
        .route("/:warehouse_id/stock", get(handlers::get_warehouse_stock))
        .route("/:warehouse_id/transactions", get(handlers::get_warehouse_history))
}

/// Stock ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(handlers::list_transactions).post(handlers::apply_transaction))
        .route(
            "/balance/:spare_part_id/:warehouse_id",
            get(handlers::get_balance),
        )
}
