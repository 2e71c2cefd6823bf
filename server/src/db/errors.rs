//! Database operations for the sync_errors table.
//!
//! The table is an append-only audit log: entries are marked resolved,
//! never deleted, and duplicate reports create duplicate rows.

use outpost_engine::SyncError;
use sqlx::{PgPool, Row};
use std::collections::BTreeSet;

/// Append a device-reported sync failure.
pub async fn insert_sync_error(
    pool: &PgPool,
    device_id: &str,
    key: &str,
    stack_trace: &str,
    metadata: &serde_json::Value,
    created_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sync_errors (device_id, key, stack_trace, metadata, created_at, resolved)
        VALUES ($1, $2, $3, $4, $5, FALSE)
        "#,
    )
    .bind(device_id)
    .bind(key)
    .bind(stack_trace)
    .bind(metadata)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark every unresolved error for `device_id` whose key is in `keys` as
/// resolved.
///
/// All-or-nothing: the keys are validated inside the transaction before
/// any row is touched, and an unmatched key rolls the whole call back
/// with [`outpost_engine::Error::UnknownErrorKeys`].
pub async fn resolve_sync_errors(
    pool: &PgPool,
    device_id: &str,
    keys: &[String],
) -> Result<u64, crate::error::AppError> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        r#"
        SELECT DISTINCT key
        FROM sync_errors
        WHERE device_id = $1 AND key = ANY($2) AND NOT resolved
        "#,
    )
    .bind(device_id)
    .bind(keys)
    .fetch_all(&mut *tx)
    .await?;

    let matched: BTreeSet<String> = rows
        .into_iter()
        .map(|row| row.try_get("key"))
        .collect::<Result<_, sqlx::Error>>()?;

    let unmatched: Vec<String> = keys
        .iter()
        .filter(|key| !matched.contains(*key))
        .cloned()
        .collect();
    if !unmatched.is_empty() {
        return Err(outpost_engine::Error::UnknownErrorKeys {
            device_id: device_id.to_string(),
            keys: unmatched,
        }
        .into());
    }

    let result = sqlx::query(
        r#"
        UPDATE sync_errors
        SET resolved = TRUE
        WHERE device_id = $1 AND key = ANY($2) AND NOT resolved
        "#,
    )
    .bind(device_id)
    .bind(keys)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}

/// Unresolved errors for one device, oldest first.
pub async fn unresolved_errors_for(
    pool: &PgPool,
    device_id: &str,
) -> Result<Vec<SyncError>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT device_id, key, stack_trace, metadata, created_at, resolved
        FROM sync_errors
        WHERE device_id = $1 AND NOT resolved
        ORDER BY created_at, id
        "#,
    )
    .bind(device_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(SyncError {
                device_id: row.try_get("device_id")?,
                key: row.try_get("key")?,
                stack_trace: row.try_get("stack_trace")?,
                metadata: row.try_get("metadata")?,
                created_at: row.try_get::<i64, _>("created_at")? as u64,
                resolved: row.try_get("resolved")?,
            })
        })
        .collect()
}
