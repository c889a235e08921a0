//! Spare part catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::validation::{validate_part_number, validate_price};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NewSparePart, SparePart, SparePartUpdate};

/// Spare part service for the parts catalog
#[derive(Clone)]
pub struct SparePartService {
    db: PgPool,
}

/// Row for spare part queries
#[derive(Debug, FromRow)]
struct SparePartRow {
    id: Uuid,
    part_number: String,
    name: String,
    description: Option<String>,
    unit_of_measure: String,
    price: Decimal,
    variant: Option<String>,
    compatibility: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SparePartRow> for SparePart {
    fn from(r: SparePartRow) -> Self {
        SparePart {
            id: r.id,
            part_number: r.part_number,
            name: r.name,
            description: r.description,
            unit_of_measure: r.unit_of_measure,
            price: r.price,
            variant: r.variant,
            compatibility: r.compatibility,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SPARE_PART_COLUMNS: &str = "id, part_number, name, description, unit_of_measure, price, \
                                  variant, compatibility, created_at, updated_at";

impl SparePartService {
    /// Create a new SparePartService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a spare part
    pub async fn create_spare_part(&self, input: NewSparePart) -> AppResult<SparePart> {
        input.validate()?;
        validate_part_number(&input.part_number)
            .map_err(|m| AppError::validation("part_number", m))?;
        validate_price(input.price).map_err(|m| AppError::validation("price", m))?;

        let part_number = input.part_number.trim().to_string();
        let compatibility = input.compatibility.unwrap_or_default();

        let row = sqlx::query_as::<_, SparePartRow>(&format!(
            r#"
            INSERT INTO spare_parts (part_number, name, description, unit_of_measure, price, variant, compatibility)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SPARE_PART_COLUMNS}
            "#
        ))
        .bind(&part_number)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.unit_of_measure)
        .bind(input.price)
        .bind(&input.variant)
        .bind(&compatibility)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict {
                        resource: "part_number".to_string(),
                        message: format!("Spare part {} already exists", part_number),
                    };
                }
            }
            e.into()
        })?;

        tracing::info!(spare_part_id = %row.id, part_number = %row.part_number, "Registered spare part");

        Ok(row.into())
    }

    /// Get a spare part by ID
    pub async fn get_spare_part(&self, spare_part_id: Uuid) -> AppResult<SparePart> {
        let row = sqlx::query_as::<_, SparePartRow>(&format!(
            "SELECT {SPARE_PART_COLUMNS} FROM spare_parts WHERE id = $1"
        ))
        .bind(spare_part_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Spare part".to_string()))?;

        Ok(row.into())
    }

    /// List the catalog ordered by part number
    pub async fn list_spare_parts(&self) -> AppResult<Vec<SparePart>> {
        let rows = sqlx::query_as::<_, SparePartRow>(&format!(
            "SELECT {SPARE_PART_COLUMNS} FROM spare_parts ORDER BY part_number"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Update the price and/or description of a spare part
    pub async fn update_spare_part(
        &self,
        spare_part_id: Uuid,
        input: SparePartUpdate,
    ) -> AppResult<SparePart> {
        let existing = self.get_spare_part(spare_part_id).await?;

        let price = input.price.unwrap_or(existing.price);
        let description = input.description.or(existing.description);

        validate_price(price).map_err(|m| AppError::validation("price", m))?;

        let row = sqlx::query_as::<_, SparePartRow>(&format!(
            r#"
            UPDATE spare_parts
            SET price = $1, description = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {SPARE_PART_COLUMNS}
            "#
        ))
        .bind(price)
        .bind(&description)
        .bind(spare_part_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
