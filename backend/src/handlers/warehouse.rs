//! HTTP handlers for warehouses and the warehouse detail page

use axum::{
    extract::State,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::models::{HistoryEntry, NewWarehouse, Warehouse};
use crate::services::stock::WarehouseStockLine;
use crate::services::{StockService, WarehouseService};
use crate::AppState;

/// Create a warehouse
pub async fn create_warehouse(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewWarehouse>,
) -> AppResult<Json<Warehouse>> {
    let service = WarehouseService::new(state.db);
    let warehouse = service.create_warehouse(input).await?;
    Ok(Json(warehouse))
}

/// Get a warehouse
pub async fn get_warehouse(
    State(state): State<AppState>,
    AppPath(warehouse_id): AppPath<Uuid>,
) -> AppResult<Json<Warehouse>> {
    let service = WarehouseService::new(state.db);
    let warehouse = service.get_warehouse(warehouse_id).await?;
    Ok(Json(warehouse))
}

/// List warehouses
pub async fn list_warehouses(State(state): State<AppState>) -> AppResult<Json<Vec<Warehouse>>> {
    let service = WarehouseService::new(state.db);
    let warehouses = service.list_warehouses().await?;
    Ok(Json(warehouses))
}

/// Get the main warehouse
pub async fn get_main_warehouse(State(state): State<AppState>) -> AppResult<Json<Warehouse>> {
    let service = WarehouseService::new(state.db);
    let warehouse = service.get_main_warehouse().await?;
    Ok(Json(warehouse))
}

/// Stock held by a warehouse
pub async fn get_warehouse_stock(
    State(state): State<AppState>,
    AppPath(warehouse_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<WarehouseStockLine>>> {
    let service = StockService::new(state.db, state.config.database.lock_timeout_ms);
    let stock = service.list_warehouse_stock(warehouse_id).await?;
    Ok(Json(stock))
}

/// Transaction history of a warehouse
pub async fn get_warehouse_history(
    State(state): State<AppState>,
    AppPath(warehouse_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    let service = StockService::new(state.db, state.config.database.lock_timeout_ms);
    let history = service.get_history(warehouse_id).await?;
    Ok(Json(history))
}
