//! Component handlers
//!
//! Each mutating handler runs inside one transaction: begin, operate, commit.
//! Returning early on error drops the transaction, which rolls it back.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use caltrack_common::db::{components, Component};
use caltrack_common::Error;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::MessageResponse;
use crate::error::{ApiError, OrFail};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddComponentRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddComponentResponse {
    pub message: &'static str,
    pub id: i64,
}

/// POST /add_component
pub async fn add_component(
    State(state): State<AppState>,
    payload: Result<Json<AddComponentRequest>, JsonRejection>,
) -> Result<Json<AddComponentResponse>, ApiError> {
    const FAILURE: &str = "Failed to add component";

    let Json(request) = payload
        .map_err(|e| Error::InvalidInput(e.body_text()))
        .or_fail(FAILURE)?;
    info!("Received component: {:?}", request);

    let name = request
        .name
        .ok_or_else(|| Error::InvalidInput("'name' is required".to_string()))
        .or_fail(FAILURE)?;

    let mut tx = state.db.begin().await.or_fail(FAILURE)?;
    let component = components::insert_component(&mut tx, &name)
        .await
        .or_fail(FAILURE)?;
    tx.commit().await.or_fail(FAILURE)?;

    info!("Added component: {} (ID: {})", component.name, component.id);
    Ok(Json(AddComponentResponse {
        message: "Component added successfully",
        id: component.id,
    }))
}

/// GET /get_components
pub async fn get_components(
    State(state): State<AppState>,
) -> Result<Json<Vec<Component>>, ApiError> {
    const FAILURE: &str = "Failed to fetch components";

    let mut conn = state.db.acquire().await.or_fail(FAILURE)?;
    let all = components::list_components(&mut conn).await.or_fail(FAILURE)?;

    Ok(Json(all))
}

/// DELETE /delete_component/:component_id
///
/// Removes the component and all of its calibration entries as one unit.
pub async fn delete_component(
    State(state): State<AppState>,
    Path(component_id): Path<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    const FAILURE: &str = "Failed to delete component";

    let mut tx = state.db.begin().await.or_fail(FAILURE)?;
    if !components::delete_component(&mut tx, component_id)
        .await
        .or_fail(FAILURE)?
    {
        return Err(ApiError::NotFound("Component not found"));
    }
    tx.commit().await.or_fail(FAILURE)?;

    info!("Deleted component {} and its calibrations", component_id);
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Component and calibrations deleted successfully!",
        }),
    ))
}
