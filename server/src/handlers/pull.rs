//! Pull handler - serves per-entity-type sync envelopes to devices.

use crate::db;
use crate::error::Result;
use crate::images::FsImageStore;
use crate::AppState;
use outpost_engine::{
    assemble::assemble, AddressFieldMap, EntityKind, ImageStore, LocationId, ScopeParams,
    SyncCursor, SyncRequest, SyncResponseEnvelope, DEFAULT_LIMIT, MAX_LIMIT,
};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use std::collections::{BTreeMap, BTreeSet};

/// Request body for pull sync.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    /// Scope discriminators; exactly one valid combination must be set
    pub scope: ScopeParams,
    /// Cursor from the previous page; absent on initial sync
    pub cursor: Option<SyncCursor>,
    /// Requesting device
    pub device_id: String,
    /// Exclude records this device created itself
    #[serde(default)]
    pub optimize: bool,
    /// Entity types to pull; absent means all of them
    pub entity_types: Option<Vec<EntityKind>>,
}

/// Response for pull sync: one envelope per requested entity type.
///
/// A failing entity type does not hide the others; its message lands in
/// `failures` while the remaining envelopes are returned as usual.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub envelopes: BTreeMap<EntityKind, SyncResponseEnvelope>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<EntityKind, String>,
}

/// Process a pull request from a device.
pub async fn handle_pull(state: &AppState, request: PullRequest) -> Result<PullResponse> {
    let scope = request.scope.parse()?;

    let mut cursor = request
        .cursor
        .unwrap_or_else(|| SyncCursor::initial(DEFAULT_LIMIT));
    cursor.limit = cursor.limit.min(MAX_LIMIT);
    cursor.validate()?;

    let sync_request = SyncRequest {
        scope,
        cursor,
        device_id: request.device_id,
        optimize: request.optimize,
    };
    let kinds = request
        .entity_types
        .unwrap_or_else(|| EntityKind::ALL.to_vec());

    // One transaction per request: counts and page data see the same
    // snapshot, and a record cannot appear twice or vanish between them.
    let mut tx = state.pool.begin().await?;

    let index = db::load_location_index(&mut *tx).await?;
    let locations = index.resolve(&sync_request.scope)?;

    let mut envelopes = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for kind in kinds {
        match build_envelope(&mut tx, state, kind, &sync_request, &locations).await {
            Ok(envelope) => {
                envelopes.insert(kind, envelope);
            }
            Err(err) => {
                tracing::warn!("sync failed for entity type {}: {}", kind, err);
                failures.insert(kind, err.to_string());
            }
        }
    }

    tx.commit().await?;

    Ok(PullResponse {
        envelopes,
        failures,
    })
}

async fn build_envelope(
    tx: &mut PgConnection,
    state: &AppState,
    kind: EntityKind,
    request: &SyncRequest,
    locations: &BTreeSet<LocationId>,
) -> Result<SyncResponseEnvelope> {
    let location_vec: Vec<String> = locations.iter().cloned().collect();

    let counts = db::fetch_counts(
        &mut *tx,
        kind,
        &location_vec,
        &request.device_id,
        request.optimize,
    )
    .await?;

    let lower_bound = request.cursor.last_modified_offset.map(|t| t as i64);
    let rows = db::fetch_candidates(&mut *tx, kind, &location_vec, lower_bound).await?;

    let mut candidates: Vec<_> = rows.into_iter().map(|row| row.into_record()).collect();
    if kind == EntityKind::Participant {
        for record in &mut candidates {
            project_address(record, &state.address_fields);
        }
    }

    let image_store;
    let store_ref: Option<&dyn ImageStore> = if kind == EntityKind::Image {
        image_store = FsImageStore::new(&state.config.image_dir);
        Some(&image_store)
    } else {
        None
    };

    let envelope = assemble(kind, request, locations, candidates, counts, store_ref)?;
    Ok(envelope)
}

/// Shape a participant's address down to the configured field subset.
fn project_address(record: &mut outpost_engine::SyncRecord, fields: &AddressFieldMap) {
    if let Some(address) = record.payload.get("address") {
        let projected = fields.project(address);
        record.payload["address"] = projected;
    }
}
