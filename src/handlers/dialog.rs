use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    models::dashboard::{DialogResponse, DraftPatch, ErrorResponse, SubmitResponse},
    AppState,
};

/// Handler for POST /api/assets/{id}/select
/// Row click: fetches the asset's details and opens the edit dialog
pub async fn select_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DialogResponse>, (StatusCode, Json<ErrorResponse>)> {
    tracing::info!("Opening editor for '{}'", id);

    state.dashboard.open_editor(&id).await.map_err(|e| {
        tracing::warn!("Editor for '{}' not opened: {}", id, e);
        e
    })?;

    Ok(Json(state.dashboard.dialog()))
}

/// Handler for GET /api/dialog
pub async fn get_dialog(State(state): State<AppState>) -> Json<DialogResponse> {
    Json(state.dashboard.dialog())
}

/// Handler for PATCH /api/dialog/draft
pub async fn patch_draft(
    State(state): State<AppState>,
    Json(patch): Json<DraftPatch>,
) -> Result<Json<DialogResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.dashboard.apply_draft_patch(&patch)?;
    Ok(Json(state.dashboard.dialog()))
}

/// Handler for POST /api/dialog/submit
pub async fn submit_dialog(
    State(state): State<AppState>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (updated, record) = state.dashboard.submit_edit()?;

    if updated {
        tracing::info!("Saved edits to '{}'", record.id);
    } else {
        tracing::debug!("'{}' is no longer in the store; edits dropped", record.id);
    }

    Ok(Json(SubmitResponse { updated, record }))
}

/// Handler for POST /api/dialog/cancel
pub async fn cancel_dialog(State(state): State<AppState>) -> Json<DialogResponse> {
    state.dashboard.cancel_edit();
    Json(state.dashboard.dialog())
}
