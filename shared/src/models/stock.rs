//! Stock ledger models: ledger entries, balances and transaction requests

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock movement recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Goods received into the source warehouse
    In,
    /// Goods issued from the source warehouse
    Out,
    /// Stock count correction, direction given by [`AdjustmentDirection`]
    Adjustment,
    /// Move between two warehouses, recorded once with both sides populated
    #[serde(alias = "TRANSFER_OUT", alias = "TRANSFER_IN")]
    Transfer,
    /// Goods returned into the source warehouse
    Return,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Adjustment => "ADJUSTMENT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Return => "RETURN",
        }
    }

    /// Parse a stored or legacy type name.
    ///
    /// `TRANSFER_OUT` and `TRANSFER_IN` both describe the single transfer movement.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(TransactionType::In),
            "OUT" => Some(TransactionType::Out),
            "ADJUSTMENT" => Some(TransactionType::Adjustment),
            "TRANSFER" | "TRANSFER_OUT" | "TRANSFER_IN" => Some(TransactionType::Transfer),
            "RETURN" => Some(TransactionType::Return),
            _ => None,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, TransactionType::Transfer)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign of an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    /// Found stock
    Increase,
    /// Shrinkage, damage, miscount
    Decrease,
}

impl AdjustmentDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentDirection::Increase => "INCREASE",
            AdjustmentDirection::Decrease => "DECREASE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "INCREASE" => Some(AdjustmentDirection::Increase),
            "DECREASE" => Some(AdjustmentDirection::Decrease),
            _ => None,
        }
    }
}

/// Whether a ledger entry adds to or removes from a given warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementDirection {
    In,
    Out,
}

/// Request to move stock, as submitted by the transaction form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub spare_part_id: Uuid,
    pub quantity: i64,
    pub transaction_type: TransactionType,
    /// Receiving warehouse for IN/RETURN, issuing warehouse otherwise
    pub source_warehouse_id: Uuid,
    pub target_warehouse_id: Option<Uuid>,
    pub adjustment_direction: Option<AdjustmentDirection>,
    /// Defaults to today when absent
    pub transaction_date: Option<NaiveDate>,
    pub remark: Option<String>,
}

impl TransactionRequest {
    /// Warehouses whose balance this request may change, ascending and deduplicated
    pub fn affected_warehouses(&self) -> Vec<Uuid> {
        let mut ids = vec![self.source_warehouse_id];
        if self.transaction_type.is_transfer() {
            ids.extend(self.target_warehouse_id);
        }
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: Uuid,
    pub transaction_date: NaiveDate,
    pub spare_part_id: Uuid,
    pub quantity: i64,
    pub transaction_type: TransactionType,
    pub source_warehouse_id: Uuid,
    pub target_warehouse_id: Option<Uuid>,
    pub adjustment_direction: Option<AdjustmentDirection>,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    /// True when the warehouse is the source or the target of this entry
    pub fn touches(&self, warehouse_id: Uuid) -> bool {
        self.source_warehouse_id == warehouse_id || self.target_warehouse_id == Some(warehouse_id)
    }

    /// Direction of this entry as seen from `warehouse_id`
    pub fn direction_for(&self, warehouse_id: Uuid) -> Option<MovementDirection> {
        if self.transaction_type.is_transfer() && self.target_warehouse_id == Some(warehouse_id) {
            return Some(MovementDirection::In);
        }
        if self.source_warehouse_id != warehouse_id {
            return None;
        }

        let direction = match self.transaction_type {
            TransactionType::In | TransactionType::Return => MovementDirection::In,
            TransactionType::Out | TransactionType::Transfer => MovementDirection::Out,
            TransactionType::Adjustment => match self.adjustment_direction {
                Some(AdjustmentDirection::Decrease) => MovementDirection::Out,
                _ => MovementDirection::In,
            },
        };
        Some(direction)
    }

    /// Change this entry made to the balance of `warehouse_id` (0 if untouched)
    pub fn signed_quantity_for(&self, warehouse_id: Uuid) -> i64 {
        match self.direction_for(warehouse_id) {
            Some(MovementDirection::In) => self.quantity,
            Some(MovementDirection::Out) => -self.quantity,
            None => 0,
        }
    }
}

/// On-hand quantity of one spare part in one warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub spare_part_id: Uuid,
    pub warehouse_id: Uuid,
    pub current_stock: i64,
    pub updated_at: DateTime<Utc>,
}

/// Result of applying a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransaction {
    pub transaction: StockTransaction,
    pub updated_balances: Vec<WarehouseStock>,
}

/// A ledger entry as displayed on a warehouse's history table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub transaction: StockTransaction,
    pub direction: MovementDirection,
    pub signed_quantity: i64,
}

impl HistoryEntry {
    /// Returns `None` when the entry does not involve `warehouse_id`
    pub fn for_warehouse(transaction: StockTransaction, warehouse_id: Uuid) -> Option<Self> {
        let direction = transaction.direction_for(warehouse_id)?;
        let signed_quantity = transaction.signed_quantity_for(warehouse_id);
        Some(Self {
            transaction,
            direction,
            signed_quantity,
        })
    }
}
