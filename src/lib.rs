// src/lib.rs

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use services::dashboard::Dashboard;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

pub mod config;
pub mod error;

pub mod services {
    pub mod asset_store;
    pub mod coincap;
    pub mod dashboard;
    pub mod edit_dialog;
    pub mod state_storage;
    pub mod view_model;
}

pub mod models;
pub mod handlers;

pub fn build_router(state: AppState) -> Router {
    use crate::handlers::{dashboard, dialog};

    Router::new()
        .route("/", get(dashboard::hello))
        .route("/api/view", get(dashboard::get_view))
        .route("/api/view/search", put(dashboard::set_search))
        .route("/api/view/sort/{key}", post(dashboard::toggle_sort))
        .route("/api/assets/refresh", post(dashboard::refresh_assets))
        .route("/api/assets/reset", post(dashboard::reset_assets))
        .route("/api/assets/{id}/select", post(dialog::select_asset))
        .route("/api/dialog", get(dialog::get_dialog))
        .route("/api/dialog/draft", patch(dialog::patch_draft))
        .route("/api/dialog/submit", post(dialog::submit_dialog))
        .route("/api/dialog/cancel", post(dialog::cancel_dialog))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
