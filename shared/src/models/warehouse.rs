//! Warehouse models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A physical stock location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    /// Default source for outgoing stock; at most one warehouse carries it
    pub is_main_warehouse: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a warehouse
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewWarehouse {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub is_main_warehouse: Option<bool>,
}

impl NewWarehouse {
    pub fn into_warehouse(self, id: Uuid, now: DateTime<Utc>) -> Warehouse {
        Warehouse {
            id,
            name: self.name.trim().to_string(),
            location: self.location,
            is_main_warehouse: self.is_main_warehouse.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }
}
