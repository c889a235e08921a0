//! HTTP handlers for stock transactions and balances

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::models::{AppliedTransaction, StockTransaction, TransactionRequest};
use crate::services::stock::StockBalance;
use crate::services::StockService;
use crate::AppState;

/// Apply a stock transaction
pub async fn apply_transaction(
    State(state): State<AppState>,
    AppJson(request): AppJson<TransactionRequest>,
) -> AppResult<(StatusCode, Json<AppliedTransaction>)> {
    let service = StockService::new(state.db, state.config.database.lock_timeout_ms);
    let applied = service.apply_transaction(request).await?;
    Ok((StatusCode::CREATED, Json(applied)))
}

/// List all stock transactions
pub async fn list_transactions(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StockTransaction>>> {
    let service = StockService::new(state.db, state.config.database.lock_timeout_ms);
    let transactions = service.list_transactions().await?;
    Ok(Json(transactions))
}

/// Balance of a spare part in a warehouse
pub async fn get_balance(
    State(state): State<AppState>,
    AppPath((spare_part_id, warehouse_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Json<StockBalance>> {
    let service = StockService::new(state.db, state.config.database.lock_timeout_ms);
    let balance = service.get_balance(spare_part_id, warehouse_id).await?;
    Ok(Json(balance))
}
