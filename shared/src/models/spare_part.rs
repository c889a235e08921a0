//! Spare part catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A spare part that can be stocked in warehouses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SparePart {
    pub id: Uuid,
    /// Manufacturer or internal part number, unique across the catalog
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    /// Unit of measure (e.g., "pcs", "litre", "set")
    pub unit_of_measure: String,
    pub price: Decimal,
    pub variant: Option<String>,
    /// Vehicle models this part fits
    pub compatibility: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a spare part
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSparePart {
    #[validate(length(min = 1, max = 64))]
    pub part_number: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 16))]
    pub unit_of_measure: String,
    pub price: Decimal,
    #[validate(length(max = 100))]
    pub variant: Option<String>,
    pub compatibility: Option<Vec<String>>,
}

impl NewSparePart {
    /// Build the catalog record. Timestamps are taken from `now`.
    pub fn into_spare_part(self, id: Uuid, now: DateTime<Utc>) -> SparePart {
        SparePart {
            id,
            part_number: self.part_number.trim().to_string(),
            name: self.name,
            description: self.description,
            unit_of_measure: self.unit_of_measure,
            price: self.price,
            variant: self.variant,
            compatibility: self.compatibility.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Editable fields of a spare part once it is in use
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparePartUpdate {
    pub price: Option<Decimal>,
    pub description: Option<String>,
}
