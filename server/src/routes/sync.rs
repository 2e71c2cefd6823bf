//! Sync endpoint routes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::auth::DeviceAuth;
use crate::error::Result;
use crate::handlers::{
    handle_list, handle_pull, handle_report, handle_resolve, ListErrorsQuery, ListErrorsResponse,
    PullRequest, PullResponse, ReportErrorRequest, ReportErrorResponse, ResolveErrorsRequest,
    ResolveErrorsResponse,
};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(pull_handler))
        .route("/sync/errors", get(list_errors_handler).post(report_error_handler))
        .route("/sync/errors/resolve", post(resolve_errors_handler))
}

/// POST /sync - Pull one page per requested entity type.
async fn pull_handler(
    State(state): State<AppState>,
    _auth: DeviceAuth,
    Json(request): Json<PullRequest>,
) -> Result<Json<PullResponse>> {
    let response = handle_pull(&state, request).await?;
    Ok(Json(response))
}

/// POST /sync/errors - Report a sync failure.
async fn report_error_handler(
    State(state): State<AppState>,
    _auth: DeviceAuth,
    Json(request): Json<ReportErrorRequest>,
) -> Result<Json<ReportErrorResponse>> {
    let response = handle_report(&state, request).await?;
    Ok(Json(response))
}

/// POST /sync/errors/resolve - Mark reported failures resolved.
async fn resolve_errors_handler(
    State(state): State<AppState>,
    _auth: DeviceAuth,
    Json(request): Json<ResolveErrorsRequest>,
) -> Result<Json<ResolveErrorsResponse>> {
    let response = handle_resolve(&state, request).await?;
    Ok(Json(response))
}

/// GET /sync/errors - List a device's unresolved failures.
async fn list_errors_handler(
    State(state): State<AppState>,
    _auth: DeviceAuth,
    Query(query): Query<ListErrorsQuery>,
) -> Result<Json<ListErrorsResponse>> {
    let response = handle_list(&state, query).await?;
    Ok(Json(response))
}
