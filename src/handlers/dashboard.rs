use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    models::dashboard::{ErrorResponse, SearchRequest, SortKey, ViewQuery, ViewResponse},
    AppState,
};

pub async fn hello() -> &'static str {
    "Hello from Coin Dashboard!"
}

/// Handler for GET /api/view
/// Renders the asset table. Query parameters override the stored view state.
pub async fn get_view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Json<ViewResponse> {
    tracing::debug!("Rendering view with query: {:?}", query);
    Json(state.dashboard.view_with(&query))
}

/// Handler for PUT /api/view/search
pub async fn set_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Json<ViewResponse> {
    state.dashboard.set_search(&request.term);
    Json(state.dashboard.view())
}

/// Handler for POST /api/view/sort/{key}
/// Column-header click
pub async fn toggle_sort(
    State(state): State<AppState>,
    Path(key): Path<SortKey>,
) -> Json<ViewResponse> {
    let sort = state.dashboard.toggle_sort(key);
    tracing::debug!("Sorting by {:?} {:?}", sort.key, sort.direction);
    Json(state.dashboard.view())
}

/// Handler for POST /api/assets/refresh
pub async fn refresh_assets(
    State(state): State<AppState>,
) -> Result<Json<ViewResponse>, (StatusCode, Json<ErrorResponse>)> {
    tracing::info!("Refreshing assets");

    match state.dashboard.refresh().await {
        Ok(count) => {
            tracing::info!("Refreshed {} assets", count);
            Ok(Json(state.dashboard.view()))
        }
        Err(e) => {
            tracing::error!("Failed to refresh assets: {}", e);
            Err(e.into())
        }
    }
}

/// Handler for POST /api/assets/reset
pub async fn reset_assets(State(state): State<AppState>) -> Json<ViewResponse> {
    tracing::info!("Resetting asset store");
    state.dashboard.reset();
    Json(state.dashboard.view())
}
