//! WebAssembly module for the workshop stock ledger
//!
//! Lets the stock transaction form run the server's rules before submitting:
//! - Request validation
//! - Balance change preview for the affected warehouses
//! - Debit/credit labels for history rows

use serde::Serialize;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::ledger::*;
pub use shared::models::*;
pub use shared::validation::*;

/// One warehouse line of a movement preview
#[derive(Debug, Serialize)]
struct PreviewLine {
    warehouse_id: Uuid,
    delta: i64,
}

fn parse_request(request_json: &str) -> Result<TransactionRequest, JsValue> {
    serde_json::from_str(request_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid transaction JSON: {}", e)))
}

/// Check a transaction request; returns an error message or nothing
#[wasm_bindgen]
pub fn validate_transaction(request_json: &str) -> Result<(), JsValue> {
    let request = parse_request(request_json)?;
    validate_transaction_request(&request).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Preview the balance changes of a request given the part's balance at the
/// source warehouse. Returns a JSON array of `{warehouse_id, delta}`.
#[wasm_bindgen]
pub fn preview_stock_movement(request_json: &str, source_balance: i64) -> Result<String, JsValue> {
    let request = parse_request(request_json)?;
    let deltas = plan_movement(&request, source_balance)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let lines: Vec<PreviewLine> = deltas
        .into_iter()
        .map(|d| PreviewLine {
            warehouse_id: d.warehouse_id,
            delta: d.delta,
        })
        .collect();

    serde_json::to_string(&lines).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// "IN", "OUT" or "" for a ledger entry viewed from a warehouse
#[wasm_bindgen]
pub fn movement_direction_label(transaction_json: &str, warehouse_id: &str) -> String {
    let transaction: StockTransaction = match serde_json::from_str(transaction_json) {
        Ok(t) => t,
        Err(_) => return String::new(),
    };
    let warehouse_id = match Uuid::parse_str(warehouse_id) {
        Ok(id) => id,
        Err(_) => return String::new(),
    };

    match transaction.direction_for(warehouse_id) {
        Some(MovementDirection::In) => "IN".to_string(),
        Some(MovementDirection::Out) => "OUT".to_string(),
        None => String::new(),
    }
}

/// Check that a quantity typed into the form is usable
#[wasm_bindgen]
pub fn is_valid_quantity(quantity: i64) -> bool {
    validate_quantity(quantity).is_ok()
}
