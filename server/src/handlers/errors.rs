//! Sync error ledger handlers - devices report failures and mark them
//! resolved.

use crate::db;
use crate::error::Result;
use crate::AppState;
use outpost_engine::SyncError;
use serde::{Deserialize, Serialize};

/// Request body for reporting a sync failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportErrorRequest {
    pub device_id: String,
    pub key: String,
    pub stack_trace: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Milliseconds since epoch; absent means "now"
    pub created_at: Option<i64>,
}

/// Response for a recorded failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportErrorResponse {
    pub key: String,
    pub created_at: i64,
}

/// Request body for resolving previously reported failures.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveErrorsRequest {
    pub device_id: String,
    pub error_keys: Vec<String>,
}

/// Response for a resolve call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveErrorsResponse {
    pub resolved_count: u64,
}

/// Query for listing a device's unresolved errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListErrorsQuery {
    pub device_id: String,
}

/// Response listing unresolved errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListErrorsResponse {
    pub errors: Vec<SyncError>,
}

/// Append a device-reported failure. Duplicate submissions append
/// duplicate entries; this is a log, not a set.
pub async fn handle_report(state: &AppState, request: ReportErrorRequest) -> Result<ReportErrorResponse> {
    let created_at = request
        .created_at
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

    db::insert_sync_error(
        &state.pool,
        &request.device_id,
        &request.key,
        &request.stack_trace,
        &request.metadata,
        created_at,
    )
    .await?;

    tracing::info!(
        "recorded sync error '{}' for device '{}'",
        request.key,
        request.device_id
    );

    Ok(ReportErrorResponse {
        key: request.key,
        created_at,
    })
}

/// Mark reported failures resolved. Any unknown key fails the whole call
/// and nothing is marked.
pub async fn handle_resolve(
    state: &AppState,
    request: ResolveErrorsRequest,
) -> Result<ResolveErrorsResponse> {
    let resolved_count =
        db::resolve_sync_errors(&state.pool, &request.device_id, &request.error_keys).await?;

    Ok(ResolveErrorsResponse { resolved_count })
}

/// List a device's unresolved errors.
pub async fn handle_list(state: &AppState, query: ListErrorsQuery) -> Result<ListErrorsResponse> {
    let errors = db::unresolved_errors_for(&state.pool, &query.device_id).await?;
    Ok(ListErrorsResponse { errors })
}
