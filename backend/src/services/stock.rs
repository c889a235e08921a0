//! Stock ledger service: applies stock transactions and answers balance and
//! history queries
//!
//! A transaction and every balance change it causes are written in one
//! database transaction. The balance rows involved are locked in ascending
//! warehouse order before the available stock is checked, so concurrent
//! movements of the same part serialise instead of losing updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shared::ledger::plan_movement;
use shared::validation::validate_transaction_request;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    AdjustmentDirection, AppliedTransaction, HistoryEntry, StockTransaction, TransactionRequest,
    TransactionType, WarehouseStock,
};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    lock_timeout_ms: u64,
}

/// Ledger entry row
#[derive(Debug, FromRow)]
struct StockTransactionRow {
    id: Uuid,
    transaction_date: NaiveDate,
    spare_part_id: Uuid,
    quantity: i64,
    transaction_type: String,
    source_warehouse_id: Uuid,
    target_warehouse_id: Option<Uuid>,
    adjustment_direction: Option<String>,
    remark: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StockTransactionRow> for StockTransaction {
    type Error = AppError;

    fn try_from(r: StockTransactionRow) -> Result<Self, Self::Error> {
        let transaction_type = TransactionType::from_str(&r.transaction_type).ok_or_else(|| {
            AppError::Internal(format!("unknown transaction type {}", r.transaction_type))
        })?;
        let adjustment_direction = match r.adjustment_direction.as_deref() {
            Some(s) => Some(AdjustmentDirection::from_str(s).ok_or_else(|| {
                AppError::Internal(format!("unknown adjustment direction {}", s))
            })?),
            None => None,
        };

        Ok(StockTransaction {
            id: r.id,
            transaction_date: r.transaction_date,
            spare_part_id: r.spare_part_id,
            quantity: r.quantity,
            transaction_type,
            source_warehouse_id: r.source_warehouse_id,
            target_warehouse_id: r.target_warehouse_id,
            adjustment_direction,
            remark: r.remark,
            created_at: r.created_at,
        })
    }
}

/// Balance row
#[derive(Debug, FromRow)]
struct WarehouseStockRow {
    spare_part_id: Uuid,
    warehouse_id: Uuid,
    current_stock: i64,
    updated_at: DateTime<Utc>,
}

impl From<WarehouseStockRow> for WarehouseStock {
    fn from(r: WarehouseStockRow) -> Self {
        WarehouseStock {
            spare_part_id: r.spare_part_id,
            warehouse_id: r.warehouse_id,
            current_stock: r.current_stock,
            updated_at: r.updated_at,
        }
    }
}

/// Balance of one spare part in one warehouse
#[derive(Debug, Clone, Serialize)]
pub struct StockBalance {
    pub spare_part_id: Uuid,
    pub warehouse_id: Uuid,
    pub current_stock: i64,
}

/// Stock line on the warehouse detail page
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WarehouseStockLine {
    pub spare_part_id: Uuid,
    pub part_number: String,
    pub name: String,
    pub unit_of_measure: String,
    pub current_stock: i64,
    pub updated_at: DateTime<Utc>,
}

const TRANSACTION_COLUMNS: &str = "id, transaction_date, spare_part_id, quantity, transaction_type, \
                                   source_warehouse_id, target_warehouse_id, adjustment_direction, \
                                   remark, created_at";

/// Newest date first; entries sharing a date keep the order they were recorded in
const LEDGER_ORDER: &str = "transaction_date DESC, entry_no ASC";

async fn ensure_exists<'e, E>(executor: E, table: &'static str, resource: &str, id: Uuid) -> AppResult<()>
where
    E: Executor<'e, Database = Postgres>,
{
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"
    ))
    .bind(id)
    .fetch_one(executor)
    .await?;

    if !exists {
        return Err(AppError::NotFound(resource.to_string()));
    }
    Ok(())
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool, lock_timeout_ms: u64) -> Self {
        Self { db, lock_timeout_ms }
    }

    /// Validate and apply a stock transaction
    pub async fn apply_transaction(&self, request: TransactionRequest) -> AppResult<AppliedTransaction> {
        validate_transaction_request(&request)?;

        // Dropping `tx` on any early return rolls everything back
        let mut tx = self.db.begin().await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;

        ensure_exists(&mut *tx, "spare_parts", "Spare part", request.spare_part_id).await?;
        ensure_exists(&mut *tx, "warehouses", "Warehouse", request.source_warehouse_id).await?;
        if let Some(target) = request.target_warehouse_id {
            ensure_exists(&mut *tx, "warehouses", "Target warehouse", target).await?;
        }

        let warehouses = request.affected_warehouses();

        // Balance rows are created lazily; make sure there is a row to lock
        sqlx::query(
            r#"
            INSERT INTO warehouse_stock (spare_part_id, warehouse_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT (spare_part_id, warehouse_id) DO NOTHING
            "#,
        )
        .bind(request.spare_part_id)
        .bind(&warehouses)
        .execute(&mut *tx)
        .await?;

        let locked = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT warehouse_id, current_stock
            FROM warehouse_stock
            WHERE spare_part_id = $1 AND warehouse_id = ANY($2)
            ORDER BY warehouse_id
            FOR UPDATE
            "#,
        )
        .bind(request.spare_part_id)
        .bind(&warehouses)
        .fetch_all(&mut *tx)
        .await?;

        let balance_of = |warehouse_id: Uuid| {
            locked
                .iter()
                .find(|(w, _)| *w == warehouse_id)
                .map(|(_, stock)| *stock)
                .unwrap_or(0)
        };

        let deltas = plan_movement(&request, balance_of(request.source_warehouse_id)).map_err(|e| {
            tracing::warn!(
                spare_part_id = %request.spare_part_id,
                source_warehouse_id = %request.source_warehouse_id,
                transaction_type = %request.transaction_type,
                quantity = request.quantity,
                "Rejected stock transaction: {}",
                e
            );
            e
        })?;
        for delta in &deltas {
            delta.apply_to(balance_of(delta.warehouse_id))?;
        }

        let transaction_date = request
            .transaction_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let row = sqlx::query_as::<_, StockTransactionRow>(&format!(
            r#"
            INSERT INTO stock_transactions (
                transaction_date, spare_part_id, quantity, transaction_type,
                source_warehouse_id, target_warehouse_id, adjustment_direction, remark
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction_date)
        .bind(request.spare_part_id)
        .bind(request.quantity)
        .bind(request.transaction_type.as_str())
        .bind(request.source_warehouse_id)
        .bind(request.target_warehouse_id)
        .bind(request.adjustment_direction.map(|d| d.as_str()))
        .bind(&request.remark)
        .fetch_one(&mut *tx)
        .await?;

        let mut updated_balances = Vec::with_capacity(deltas.len());
        for delta in &deltas {
            let balance = sqlx::query_as::<_, WarehouseStockRow>(
                r#"
                UPDATE warehouse_stock
                SET current_stock = current_stock + $3, updated_at = NOW()
                WHERE spare_part_id = $1 AND warehouse_id = $2
                RETURNING spare_part_id, warehouse_id, current_stock, updated_at
                "#,
            )
            .bind(request.spare_part_id)
            .bind(delta.warehouse_id)
            .bind(delta.delta)
            .fetch_one(&mut *tx)
            .await?;
            updated_balances.push(WarehouseStock::from(balance));
        }

        let transaction = StockTransaction::try_from(row)?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            transaction_type = %transaction.transaction_type,
            spare_part_id = %transaction.spare_part_id,
            quantity = transaction.quantity,
            "Applied stock transaction"
        );

        Ok(AppliedTransaction {
            transaction,
            updated_balances,
        })
    }

    /// Current balance of a spare part in a warehouse, 0 if never stocked there
    pub async fn get_balance(&self, spare_part_id: Uuid, warehouse_id: Uuid) -> AppResult<StockBalance> {
        let current_stock = sqlx::query_scalar::<_, i64>(
            "SELECT current_stock FROM warehouse_stock WHERE spare_part_id = $1 AND warehouse_id = $2",
        )
        .bind(spare_part_id)
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?;

        let current_stock = match current_stock {
            Some(stock) => stock,
            None => {
                ensure_exists(&self.db, "spare_parts", "Spare part", spare_part_id).await?;
                ensure_exists(&self.db, "warehouses", "Warehouse", warehouse_id).await?;
                0
            }
        };

        Ok(StockBalance {
            spare_part_id,
            warehouse_id,
            current_stock,
        })
    }

    /// Ledger entries where the warehouse is source or target, newest date
    /// first; entries on the same date keep the order they were recorded in
    pub async fn get_history(&self, warehouse_id: Uuid) -> AppResult<Vec<HistoryEntry>> {
        ensure_exists(&self.db, "warehouses", "Warehouse", warehouse_id).await?;

        let rows = sqlx::query_as::<_, StockTransactionRow>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM stock_transactions
            WHERE source_warehouse_id = $1 OR target_warehouse_id = $1
            ORDER BY {LEDGER_ORDER}
            "#
        ))
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            let transaction = StockTransaction::try_from(row)?;
            history.extend(HistoryEntry::for_warehouse(transaction, warehouse_id));
        }
        Ok(history)
    }

    /// All ledger entries, newest date first, same-date entries in recorded order
    pub async fn list_transactions(&self) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, StockTransactionRow>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM stock_transactions
            ORDER BY {LEDGER_ORDER}
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockTransaction::try_from).collect()
    }

    /// Stock held by a warehouse, ordered by part number
    pub async fn list_warehouse_stock(&self, warehouse_id: Uuid) -> AppResult<Vec<WarehouseStockLine>> {
        ensure_exists(&self.db, "warehouses", "Warehouse", warehouse_id).await?;

        let lines = sqlx::query_as::<_, WarehouseStockLine>(
            r#"
            SELECT ws.spare_part_id, sp.part_number, sp.name, sp.unit_of_measure,
                   ws.current_stock, ws.updated_at
            FROM warehouse_stock ws
            JOIN spare_parts sp ON sp.id = ws.spare_part_id
            WHERE ws.warehouse_id = $1
            ORDER BY sp.part_number
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(lines)
    }
}
