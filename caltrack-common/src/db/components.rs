//! Component data access

use super::models::Component;
use crate::Result;
use sqlx::SqliteConnection;
use tracing::debug;

/// Insert a component; a duplicate name fails with a unique-constraint error
pub async fn insert_component(conn: &mut SqliteConnection, name: &str) -> Result<Component> {
    let id = sqlx::query("INSERT INTO component (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok(Component {
        id,
        name: name.to_string(),
    })
}

/// All components in id order
pub async fn list_components(conn: &mut SqliteConnection) -> Result<Vec<Component>> {
    let components = sqlx::query_as::<_, Component>("SELECT id, name FROM component ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    Ok(components)
}

pub async fn get_component(conn: &mut SqliteConnection, id: i64) -> Result<Option<Component>> {
    let component = sqlx::query_as::<_, Component>("SELECT id, name FROM component WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(component)
}

/// Delete a component together with all of its calibration entries
///
/// Both deletes run on the caller's connection, so inside a transaction they
/// commit or roll back together. Returns false when no such component exists.
pub async fn delete_component(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    if get_component(&mut *conn, id).await?.is_none() {
        return Ok(false);
    }

    let removed = sqlx::query("DELETE FROM calibration_data WHERE component_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM component WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    debug!(component_id = id, removed, "Deleted component and its calibrations");
    Ok(true)
}
