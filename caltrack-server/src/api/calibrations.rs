//! Calibration entry handlers
//!
//! `add_calibration` and `update_cal` notify connected clients after commit.
//! Status updates and deletes do not.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use caltrack_common::db::{calibrations, Calibration, CalibrationUpdate, StatusUpdate};
use caltrack_common::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::MessageResponse;
use crate::error::{ApiError, OrFail};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddCalibrationRequest {
    pub component_id: Option<i64>,
    pub cal_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddCalibrationResponse {
    pub message: &'static str,
    pub cal: Calibration,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub updates: Vec<CalibrationUpdate>,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub message: &'static str,
    /// Ids in the batch that matched no entry
    pub skipped: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub id: Option<i64>,
    #[serde(flatten)]
    pub status: StatusUpdate,
}

fn missing(field: &str) -> Error {
    Error::InvalidInput(format!("'{}' is required", field))
}

/// POST /add_calibration
pub async fn add_calibration(
    State(state): State<AppState>,
    payload: Result<Json<AddCalibrationRequest>, JsonRejection>,
) -> Result<Json<AddCalibrationResponse>, ApiError> {
    const FAILURE: &str = "Failed to add calibration";

    let Json(request) = payload
        .map_err(|e| Error::InvalidInput(e.body_text()))
        .or_fail(FAILURE)?;
    let component_id = request.component_id.ok_or_else(|| missing("component_id")).or_fail(FAILURE)?;
    let cal_number = request.cal_number.ok_or_else(|| missing("cal_number")).or_fail(FAILURE)?;

    let mut tx = state.db.begin().await.or_fail(FAILURE)?;
    let cal = calibrations::insert_calibration(&mut tx, component_id, &cal_number)
        .await
        .or_fail(FAILURE)?;
    tx.commit().await.or_fail(FAILURE)?;

    info!(
        "Added calibration {} (ID: {}) to component {}",
        cal.cal_number, cal.id, cal.component_id
    );
    state.notifier.notify_calibrations_updated();

    Ok(Json(AddCalibrationResponse {
        message: "Calibration entry added successfully",
        cal,
    }))
}

/// GET /get_calibrations/:component_id
///
/// Unknown components yield an empty list.
pub async fn get_calibrations(
    State(state): State<AppState>,
    Path(component_id): Path<i64>,
) -> Result<Json<Vec<Calibration>>, ApiError> {
    const FAILURE: &str = "Failed to fetch calibrations";

    let mut conn = state.db.acquire().await.or_fail(FAILURE)?;
    let cals = calibrations::list_for_component(&mut conn, component_id)
        .await
        .or_fail(FAILURE)?;

    Ok(Json(cals))
}

/// POST /update_cal
///
/// Applies the whole batch in one transaction and notifies once on success.
/// Ids that match no entry are skipped and listed in the response.
pub async fn update_cal(
    State(state): State<AppState>,
    payload: Result<Json<BulkUpdateRequest>, JsonRejection>,
) -> Result<Json<BulkUpdateResponse>, ApiError> {
    const FAILURE: &str = "Failed to update calibrations";

    let Json(request) = payload
        .map_err(|e| Error::InvalidInput(e.body_text()))
        .or_fail(FAILURE)?;

    let mut tx = state.db.begin().await.or_fail(FAILURE)?;
    let outcome = calibrations::apply_updates(&mut tx, &request.updates)
        .await
        .or_fail(FAILURE)?;
    tx.commit().await.or_fail(FAILURE)?;

    if !outcome.skipped.is_empty() {
        debug!("Bulk update skipped missing ids {:?}", outcome.skipped);
    }
    info!("Updated {} calibrations", outcome.applied);
    state.notifier.notify_calibrations_updated();

    Ok(Json(BulkUpdateResponse {
        message: "Calibrations updated successfully!",
        skipped: outcome.skipped,
    }))
}

/// POST /update_status
///
/// The entry id travels in the payload.
pub async fn update_status(
    State(state): State<AppState>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    apply_status(&state, None, payload).await
}

/// POST /update_status/:cal_id
///
/// A payload `id` takes precedence over the path.
pub async fn update_status_for(
    State(state): State<AppState>,
    Path(cal_id): Path<i64>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    apply_status(&state, Some(cal_id), payload).await
}

async fn apply_status(
    state: &AppState,
    path_id: Option<i64>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    const FAILURE: &str = "Failed to update status";

    let Json(request) = payload
        .map_err(|e| Error::InvalidInput(e.body_text()))
        .or_fail(FAILURE)?;
    let id = request.id.or(path_id).ok_or_else(|| missing("id")).or_fail(FAILURE)?;

    let mut tx = state.db.begin().await.or_fail(FAILURE)?;
    if calibrations::update_status(&mut tx, id, &request.status)
        .await
        .or_fail(FAILURE)?
        .is_none()
    {
        return Err(ApiError::NotFound("Entry not found"));
    }
    tx.commit().await.or_fail(FAILURE)?;

    debug!("Updated status of calibration {}: {:?}", id, request.status);
    Ok(Json(MessageResponse {
        message: "Status updated successfully!",
    }))
}

/// DELETE /delete_cal/:cal_id
pub async fn delete_cal(
    State(state): State<AppState>,
    Path(cal_id): Path<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    const FAILURE: &str = "Failed to delete calibration";

    let mut tx = state.db.begin().await.or_fail(FAILURE)?;
    if !calibrations::delete_calibration(&mut tx, cal_id)
        .await
        .or_fail(FAILURE)?
    {
        return Err(ApiError::NotFound("Calibration not found"));
    }
    tx.commit().await.or_fail(FAILURE)?;

    info!("Deleted calibration {}", cal_id);
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Calibration deleted successfully!",
        }),
    ))
}
