//! Stock ledger rules
//!
//! [`plan_movement`] turns a validated request into per-warehouse balance
//! deltas and is the single place where transaction types get their meaning.
//! The server applies those deltas inside a database transaction; [`StockLedger`]
//! applies them to an in-memory store for client-side previews and tests.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AdjustmentDirection, AppliedTransaction, SparePart, StockTransaction, TransactionRequest,
    TransactionType, Warehouse, WarehouseStock,
};
use crate::validation::validate_transaction_request;

/// Ledger rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: Uuid },

    #[error(
        "Insufficient stock of spare part {spare_part_id} in warehouse {warehouse_id}: \
         available {available}, requested {requested}"
    )]
    InsufficientStock {
        spare_part_id: Uuid,
        warehouse_id: Uuid,
        available: i64,
        requested: i64,
    },

    #[error("Inconsistent transfer: {0}")]
    InconsistentTransfer(String),
}

impl LedgerError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        LedgerError::NotFound { resource, id }
    }
}

/// Signed change to one warehouse's balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    pub warehouse_id: Uuid,
    pub delta: i64,
}

impl StockDelta {
    /// New balance after applying this delta to `current`
    pub fn apply_to(&self, current: i64) -> Result<i64, LedgerError> {
        let next = current
            .checked_add(self.delta)
            .ok_or_else(|| LedgerError::validation("quantity", "Quantity overflows the stock balance"))?;
        if next < 0 {
            return Err(LedgerError::validation(
                "quantity",
                "Movement would drive the stock balance negative",
            ));
        }
        Ok(next)
    }
}

/// Compute the balance deltas for `request` given the current balance of the
/// part at its source warehouse.
///
/// Debits are checked against `source_balance`; a request that would take the
/// source below zero fails with [`LedgerError::InsufficientStock`]. Transfers
/// always yield two deltas, debit first.
pub fn plan_movement(
    request: &TransactionRequest,
    source_balance: i64,
) -> Result<Vec<StockDelta>, LedgerError> {
    validate_transaction_request(request)?;

    let source = request.source_warehouse_id;
    let quantity = request.quantity;

    let debit = |warehouse_id: Uuid| -> Result<StockDelta, LedgerError> {
        if source_balance < quantity {
            return Err(LedgerError::InsufficientStock {
                spare_part_id: request.spare_part_id,
                warehouse_id,
                available: source_balance,
                requested: quantity,
            });
        }
        Ok(StockDelta {
            warehouse_id,
            delta: -quantity,
        })
    };
    let credit = |warehouse_id: Uuid| StockDelta {
        warehouse_id,
        delta: quantity,
    };

    let deltas = match request.transaction_type {
        TransactionType::In | TransactionType::Return => vec![credit(source)],
        TransactionType::Out => vec![debit(source)?],
        TransactionType::Adjustment => match request.adjustment_direction {
            Some(AdjustmentDirection::Increase) => vec![credit(source)],
            Some(AdjustmentDirection::Decrease) => vec![debit(source)?],
            None => {
                return Err(LedgerError::validation(
                    "adjustment_direction",
                    "Adjustments must state INCREASE or DECREASE",
                ))
            }
        },
        TransactionType::Transfer => {
            let target = request
                .target_warehouse_id
                .ok_or_else(|| LedgerError::InconsistentTransfer("transfer requires a target warehouse".to_string()))?;
            vec![debit(source)?, credit(target)]
        }
    };

    Ok(deltas)
}

/// In-memory stock ledger
///
/// Holds its own catalog so it can report dangling references the same way
/// the database-backed service does. Every mutation is computed in full before
/// anything is written, so a rejected request leaves the ledger untouched.
#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    spare_parts: HashMap<Uuid, SparePart>,
    warehouses: HashMap<Uuid, Warehouse>,
    balances: HashMap<(Uuid, Uuid), WarehouseStock>,
    entries: Vec<StockTransaction>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_spare_part(&mut self, spare_part: SparePart) {
        self.spare_parts.insert(spare_part.id, spare_part);
    }

    /// Register a warehouse. A new main warehouse takes the flag from the old one.
    pub fn add_warehouse(&mut self, warehouse: Warehouse) {
        if warehouse.is_main_warehouse {
            for existing in self.warehouses.values_mut() {
                existing.is_main_warehouse = false;
            }
        }
        self.warehouses.insert(warehouse.id, warehouse);
    }

    pub fn spare_part(&self, id: Uuid) -> Option<&SparePart> {
        self.spare_parts.get(&id)
    }

    pub fn warehouse(&self, id: Uuid) -> Option<&Warehouse> {
        self.warehouses.get(&id)
    }

    pub fn main_warehouse(&self) -> Option<&Warehouse> {
        self.warehouses.values().find(|w| w.is_main_warehouse)
    }

    /// Validate and apply a transaction, returning the entry and the changed balances
    pub fn apply_transaction(
        &mut self,
        request: TransactionRequest,
    ) -> Result<AppliedTransaction, LedgerError> {
        validate_transaction_request(&request)?;

        if !self.spare_parts.contains_key(&request.spare_part_id) {
            return Err(LedgerError::not_found("Spare part", request.spare_part_id));
        }
        for warehouse_id in request.affected_warehouses() {
            if !self.warehouses.contains_key(&warehouse_id) {
                return Err(LedgerError::not_found("Warehouse", warehouse_id));
            }
        }

        let source_balance = self.get_balance(request.spare_part_id, request.source_warehouse_id);
        let deltas = plan_movement(&request, source_balance)?;

        let next_balances = deltas
            .iter()
            .map(|d| {
                let current = self.get_balance(request.spare_part_id, d.warehouse_id);
                d.apply_to(current).map(|next| (d.warehouse_id, next))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let transaction = StockTransaction {
            id: Uuid::new_v4(),
            transaction_date: request.transaction_date.unwrap_or_else(|| now.date_naive()),
            spare_part_id: request.spare_part_id,
            quantity: request.quantity,
            transaction_type: request.transaction_type,
            source_warehouse_id: request.source_warehouse_id,
            target_warehouse_id: request.target_warehouse_id,
            adjustment_direction: request.adjustment_direction,
            remark: request.remark,
            created_at: now,
        };

        let updated_balances = next_balances
            .into_iter()
            .map(|(warehouse_id, current_stock)| {
                let row = WarehouseStock {
                    spare_part_id: transaction.spare_part_id,
                    warehouse_id,
                    current_stock,
                    updated_at: now,
                };
                self.balances
                    .insert((transaction.spare_part_id, warehouse_id), row.clone());
                row
            })
            .collect();

        self.entries.push(transaction.clone());

        Ok(AppliedTransaction {
            transaction,
            updated_balances,
        })
    }

    /// Current balance, 0 when the part was never stocked in the warehouse
    pub fn get_balance(&self, spare_part_id: Uuid, warehouse_id: Uuid) -> i64 {
        self.balances
            .get(&(spare_part_id, warehouse_id))
            .map(|s| s.current_stock)
            .unwrap_or(0)
    }

    /// Entries where the warehouse is source or target, newest date first.
    /// Entries sharing a date stay in the order they were applied.
    pub fn get_history(&self, warehouse_id: Uuid) -> Vec<&StockTransaction> {
        let mut history: Vec<&StockTransaction> = self
            .entries
            .iter()
            .filter(|t| t.touches(warehouse_id))
            .collect();
        history.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        history
    }

    /// Balance rows held by a warehouse, ordered by part number
    pub fn warehouse_stock(&self, warehouse_id: Uuid) -> Vec<&WarehouseStock> {
        let mut rows: Vec<&WarehouseStock> = self
            .balances
            .values()
            .filter(|s| s.warehouse_id == warehouse_id)
            .collect();
        rows.sort_by_key(|s| {
            self.spare_parts
                .get(&s.spare_part_id)
                .map(|p| p.part_number.as_str())
        });
        rows
    }

    /// All entries in the order they were applied
    pub fn transactions(&self) -> &[StockTransaction] {
        &self.entries
    }
}
