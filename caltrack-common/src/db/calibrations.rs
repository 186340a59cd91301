//! Calibration entry data access

use super::models::{BulkUpdateOutcome, Calibration, CalibrationUpdate, StatusUpdate};
use crate::Result;
use sqlx::SqliteConnection;
use tracing::debug;

const SELECT_COLUMNS: &str = "SELECT id, component_id, cal_number, description, pri, sec, reso, dm, \
     pri_completed, sec_completed, reso_completed, dm_completed FROM calibration_data";

/// Insert a calibration entry with empty values and all sub-tasks incomplete
///
/// Fails with a foreign-key error when `component_id` names no component.
pub async fn insert_calibration(
    conn: &mut SqliteConnection,
    component_id: i64,
    cal_number: &str,
) -> Result<Calibration> {
    let id = sqlx::query("INSERT INTO calibration_data (component_id, cal_number) VALUES (?, ?)")
        .bind(component_id)
        .bind(cal_number)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok(Calibration {
        id,
        component_id,
        cal_number: cal_number.to_string(),
        description: None,
        pri: None,
        sec: None,
        reso: None,
        dm: None,
        pri_completed: false,
        sec_completed: false,
        reso_completed: false,
        dm_completed: false,
    })
}

pub async fn get_calibration(conn: &mut SqliteConnection, id: i64) -> Result<Option<Calibration>> {
    let cal = sqlx::query_as::<_, Calibration>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(cal)
}

/// Entries belonging to a component, in insertion order
pub async fn list_for_component(
    conn: &mut SqliteConnection,
    component_id: i64,
) -> Result<Vec<Calibration>> {
    let cals = sqlx::query_as::<_, Calibration>(&format!(
        "{} WHERE component_id = ? ORDER BY id",
        SELECT_COLUMNS
    ))
    .bind(component_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(cals)
}

/// Persist every mutable column of an entry
async fn save_calibration(conn: &mut SqliteConnection, cal: &Calibration) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE calibration_data
        SET description = ?, pri = ?, sec = ?, reso = ?, dm = ?,
            pri_completed = ?, sec_completed = ?, reso_completed = ?, dm_completed = ?
        WHERE id = ?
        "#,
    )
    .bind(&cal.description)
    .bind(&cal.pri)
    .bind(&cal.sec)
    .bind(&cal.reso)
    .bind(&cal.dm)
    .bind(cal.pri_completed)
    .bind(cal.sec_completed)
    .bind(cal.reso_completed)
    .bind(cal.dm_completed)
    .bind(cal.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Apply a batch of value updates
///
/// Ids matching no row are skipped and reported; an error on any row aborts
/// the batch (the caller's transaction then rolls back).
pub async fn apply_updates(
    conn: &mut SqliteConnection,
    updates: &[CalibrationUpdate],
) -> Result<BulkUpdateOutcome> {
    let mut outcome = BulkUpdateOutcome::default();

    for update in updates {
        match get_calibration(&mut *conn, update.id).await? {
            Some(mut cal) => {
                update.apply_to(&mut cal);
                save_calibration(&mut *conn, &cal).await?;
                outcome.applied += 1;
            }
            None => {
                debug!(cal_id = update.id, "Skipping update for missing calibration");
                outcome.skipped.push(update.id);
            }
        }
    }

    Ok(outcome)
}

/// Set the completion flags present in `status`; None if the entry is missing
pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: &StatusUpdate,
) -> Result<Option<Calibration>> {
    let Some(mut cal) = get_calibration(&mut *conn, id).await? else {
        return Ok(None);
    };

    status.apply_to(&mut cal);
    save_calibration(&mut *conn, &cal).await?;

    Ok(Some(cal))
}

/// Delete one entry; returns false when it did not exist
pub async fn delete_calibration(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let removed = sqlx::query("DELETE FROM calibration_data WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(removed > 0)
}
