//! Candidate fetch and count queries for the syncable entity tables.
//!
//! The location-membership and lower-bound predicates are pushed down to
//! SQL; the engine re-applies every filter, so these queries only need to
//! be a superset of the page.

use outpost_engine::{EntityKind, SyncCounts, SyncRecord};
use sqlx::{PgExecutor, Row};
use std::collections::BTreeSet;

/// Table backing each entity kind. Image candidates are participants:
/// image state lives on the filesystem, keyed and voided at the
/// participant level.
fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Participant | EntityKind::Image => "participants",
        EntityKind::Visit => "visits",
        EntityKind::Template => "templates",
    }
}

/// A syncable row from one of the entity tables.
#[derive(Debug)]
pub struct StoredRecord {
    pub uuid: String,
    pub last_modified: i64,
    pub voided: bool,
    pub location_ids: Vec<String>,
    pub origin_device_id: Option<String>,
    pub payload: serde_json::Value,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredRecord {
            uuid: row.try_get("uuid")?,
            last_modified: row.try_get("last_modified")?,
            voided: row.try_get("voided")?,
            location_ids: row.try_get("location_ids")?,
            origin_device_id: row.try_get("origin_device_id")?,
            payload: row.try_get("payload")?,
        })
    }
}

impl StoredRecord {
    /// Convert a database row to an engine record.
    pub fn into_record(self) -> SyncRecord {
        SyncRecord {
            uuid: self.uuid,
            last_modified: self.last_modified as u64,
            voided: self.voided,
            location_ids: BTreeSet::from_iter(self.location_ids),
            origin_device_id: self.origin_device_id,
            payload: self.payload,
        }
    }
}

/// Fetch page candidates for one entity kind within a location set.
///
/// `lower_bound` is the cursor's boundary timestamp; the bound is
/// inclusive because records at the boundary may still be undelivered.
pub async fn fetch_candidates<'e>(
    executor: impl PgExecutor<'e>,
    kind: EntityKind,
    locations: &[String],
    lower_bound: Option<i64>,
) -> Result<Vec<StoredRecord>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT uuid, last_modified, voided, location_ids, origin_device_id, payload
        FROM {}
        WHERE location_ids && $1
          AND ($2::BIGINT IS NULL OR last_modified >= $2)
        ORDER BY last_modified, uuid
        "#,
        table(kind)
    );

    sqlx::query_as::<_, StoredRecord>(&query)
        .bind(locations)
        .bind(lower_bound)
        .fetch_all(executor)
        .await
}

/// Count records of one kind within a location set.
///
/// Same membership predicate as [`fetch_candidates`], cursor-independent.
/// The ignored count (records the optimize pass will skip) is reported
/// only for kinds with an origin-device attribute and only when optimize
/// is on, matching the engine's in-memory aggregator.
pub async fn fetch_counts<'e>(
    executor: impl PgExecutor<'e>,
    kind: EntityKind,
    locations: &[String],
    device_id: &str,
    optimize: bool,
) -> Result<SyncCounts, sqlx::Error> {
    let query = format!(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE NOT voided) AS active_count,
            COUNT(*) FILTER (WHERE voided) AS voided_count,
            COUNT(*) FILTER (WHERE origin_device_id = $2) AS device_own
        FROM {}
        WHERE location_ids && $1
        "#,
        table(kind)
    );

    let row = sqlx::query(&query)
        .bind(locations)
        .bind(device_id)
        .fetch_one(executor)
        .await?;

    let active_count: i64 = row.try_get("active_count")?;
    let voided_count: i64 = row.try_get("voided_count")?;
    let device_own: i64 = row.try_get("device_own")?;

    let ignored_count = if optimize && kind.supports_device_exclusion() {
        Some(device_own as u64)
    } else {
        None
    };

    Ok(SyncCounts {
        total: (active_count + voided_count) as u64,
        active_count: active_count as u64,
        voided_count: voided_count as u64,
        ignored_count,
    })
}
