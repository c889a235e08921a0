//! Validation utilities for the workshop stock ledger
//!
//! The same rules run on the server before a request touches the database and
//! in the browser (via the wasm module) before a form is submitted.

use rust_decimal::Decimal;

use crate::ledger::LedgerError;
use crate::models::{TransactionRequest, TransactionType};

/// Longest remark accepted on a ledger entry
pub const MAX_REMARK_LEN: usize = 500;

// ============================================================================
// Stock Movement Validations
// ============================================================================

/// Quantities are whole units and strictly positive
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

pub fn validate_remark(remark: Option<&str>) -> Result<(), &'static str> {
    match remark {
        Some(r) if r.chars().count() > MAX_REMARK_LEN => Err("Remark must be at most 500 characters"),
        _ => Ok(()),
    }
}

/// Check the shape of a transaction request.
///
/// Existence of the referenced records and available stock are checked later
/// against the store; this only looks at the request itself.
pub fn validate_transaction_request(request: &TransactionRequest) -> Result<(), LedgerError> {
    validate_quantity(request.quantity).map_err(|m| LedgerError::validation("quantity", m))?;
    validate_remark(request.remark.as_deref()).map_err(|m| LedgerError::validation("remark", m))?;

    match request.transaction_type {
        TransactionType::Transfer => match request.target_warehouse_id {
            None => {
                return Err(LedgerError::InconsistentTransfer(
                    "transfer requires a target warehouse".to_string(),
                ))
            }
            Some(target) if target == request.source_warehouse_id => {
                return Err(LedgerError::InconsistentTransfer(
                    "source and target warehouse must differ".to_string(),
                ))
            }
            Some(_) => {}
        },
        _ => {
            if request.target_warehouse_id.is_some() {
                return Err(LedgerError::validation(
                    "target_warehouse_id",
                    "Only transfers have a target warehouse",
                ));
            }
        }
    }

    match (request.transaction_type, request.adjustment_direction) {
        (TransactionType::Adjustment, None) => Err(LedgerError::validation(
            "adjustment_direction",
            "Adjustments must state INCREASE or DECREASE",
        )),
        (TransactionType::Adjustment, Some(_)) | (_, None) => Ok(()),
        (_, Some(_)) => Err(LedgerError::validation(
            "adjustment_direction",
            "Only adjustments carry a direction",
        )),
    }
}

// ============================================================================
// Catalog Validations
// ============================================================================

/// Prices may be zero (free-issue parts) but never negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Part numbers: letters, digits, '-', '.', '/' and no whitespace
pub fn validate_part_number(part_number: &str) -> Result<(), &'static str> {
    let trimmed = part_number.trim();
    if trimmed.is_empty() {
        return Err("Part number is required");
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/'))
    {
        return Err("Part number may only contain letters, digits, '-', '.' and '/'");
    }
    Ok(())
}
