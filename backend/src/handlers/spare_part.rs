//! HTTP handlers for the spare part catalog

use axum::{
    extract::State,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::models::{NewSparePart, SparePart, SparePartUpdate};
use crate::services::SparePartService;
use crate::AppState;

/// Register a spare part
pub async fn create_spare_part(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewSparePart>,
) -> AppResult<Json<SparePart>> {
    let service = SparePartService::new(state.db);
    let spare_part = service.create_spare_part(input).await?;
    Ok(Json(spare_part))
}

/// Get a spare part
pub async fn get_spare_part(
    State(state): State<AppState>,
    AppPath(spare_part_id): AppPath<Uuid>,
) -> AppResult<Json<SparePart>> {
    let service = SparePartService::new(state.db);
    let spare_part = service.get_spare_part(spare_part_id).await?;
    Ok(Json(spare_part))
}

/// List the spare part catalog
pub async fn list_spare_parts(State(state): State<AppState>) -> AppResult<Json<Vec<SparePart>>> {
    let service = SparePartService::new(state.db);
    let spare_parts = service.list_spare_parts().await?;
    Ok(Json(spare_parts))
}

/// Update price or description of a spare part
pub async fn update_spare_part(
    State(state): State<AppState>,
    AppPath(spare_part_id): AppPath<Uuid>,
    AppJson(input): AppJson<SparePartUpdate>,
) -> AppResult<Json<SparePart>> {
    let service = SparePartService::new(state.db);
    let spare_part = service.update_spare_part(spare_part_id, input).await?;
    Ok(Json(spare_part))
}
