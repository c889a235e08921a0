//! Warehouse service

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NewWarehouse, Warehouse};

/// Warehouse service for stock locations
#[derive(Clone)]
pub struct WarehouseService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct WarehouseRow {
    id: Uuid,
    name: String,
    location: Option<String>,
    is_main_warehouse: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(r: WarehouseRow) -> Self {
        Warehouse {
            id: r.id,
            name: r.name,
            location: r.location,
            is_main_warehouse: r.is_main_warehouse,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl WarehouseService {
    /// Create a new WarehouseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a warehouse. A new main warehouse takes the flag from the current one.
    pub async fn create_warehouse(&self, input: NewWarehouse) -> AppResult<Warehouse> {
        input.validate()?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("name", "Warehouse name is required"));
        }
        let is_main = input.is_main_warehouse.unwrap_or(false);

        let mut tx = self.db.begin().await?;

        if is_main {
            sqlx::query(
                "UPDATE warehouses SET is_main_warehouse = FALSE, updated_at = NOW() WHERE is_main_warehouse",
            )
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, WarehouseRow>(
            r#"
            INSERT INTO warehouses (name, location, is_main_warehouse)
            VALUES ($1, $2, $3)
            RETURNING id, name, location, is_main_warehouse, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&input.location)
        .bind(is_main)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict {
                        resource: "is_main_warehouse".to_string(),
                        message: "Another main warehouse was set at the same time".to_string(),
                    };
                }
            }
            e.into()
        })?;

        tx.commit().await?;

        tracing::info!(warehouse_id = %row.id, is_main_warehouse = is_main, "Created warehouse");

        Ok(row.into())
    }

    /// Get a warehouse by ID
    pub async fn get_warehouse(&self, warehouse_id: Uuid) -> AppResult<Warehouse> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            "SELECT id, name, location, is_main_warehouse, created_at, updated_at FROM warehouses WHERE id = $1",
        )
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        Ok(row.into())
    }

    /// List warehouses, main warehouse first
    pub async fn list_warehouses(&self) -> AppResult<Vec<Warehouse>> {
        let rows = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, name, location, is_main_warehouse, created_at, updated_at
            FROM warehouses
            ORDER BY is_main_warehouse DESC, name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get the main warehouse
    pub async fn get_main_warehouse(&self) -> AppResult<Warehouse> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            "SELECT id, name, location, is_main_warehouse, created_at, updated_at FROM warehouses WHERE is_main_warehouse",
        )
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Main warehouse".to_string()))?;

        Ok(row.into())
    }
}
