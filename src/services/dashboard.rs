//! Dashboard
//!
//! Application-root state container. Owns the asset store, the transient
//! table state, the edit dialog and the asset source, and implements every
//! user action. Locks are only held for synchronous mutation, never across
//! a fetch.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::DashboardError;
use crate::models::asset::{AssetCollectionState, AssetRecord, FetchStatus};
use crate::models::dashboard::{
    AssetRow, DialogResponse, DraftPatch, SortKey, SortState, ViewQuery, ViewResponse, ViewState,
};
use crate::services::asset_store::AssetStore;
use crate::services::coincap::AssetSource;
use crate::services::edit_dialog::EditDialog;
use crate::services::view_model::derive_view;

pub const NO_DATA_PLACEHOLDER: &str = "No data available";

pub struct Dashboard {
    store: AssetStore,
    source: Arc<dyn AssetSource>,
    view: RwLock<ViewState>,
    dialog: Mutex<EditDialog>,
    icon_url_template: String,
}

impl Dashboard {
    pub fn new(store: AssetStore, source: Arc<dyn AssetSource>, icon_url_template: String) -> Self {
        Self {
            store,
            source,
            view: RwLock::new(ViewState::default()),
            dialog: Mutex::new(EditDialog::new()),
            icon_url_template,
        }
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn snapshot(&self) -> AssetCollectionState {
        self.store.snapshot()
    }

    /// Fetch the asset list (a fresh cached list is reused) and replace the
    /// store with it. On failure the existing records stay and the store is
    /// marked failed.
    pub async fn load(&self) -> Result<usize, DashboardError> {
        match self.source.fetch_assets().await {
            Ok(records) => {
                let count = records.len();
                self.store.replace_all(records);
                info!("Loaded {} assets", count);
                Ok(count)
            }
            Err(e) => {
                error!("Error fetching data: {}", e);
                self.store.record_failure(&e.to_string());
                Err(e)
            }
        }
    }

    /// Refresh click: bypass the freshness window and fetch again
    pub async fn refresh(&self) -> Result<usize, DashboardError> {
        self.source.invalidate().await;
        self.load().await
    }

    pub fn reset(&self) {
        self.store.reset();
    }

    pub fn set_search(&self, term: &str) {
        self.view.write().search_term = term.to_string();
    }

    /// Column-header click
    pub fn toggle_sort(&self, key: SortKey) -> SortState {
        let mut view = self.view.write();
        view.sort = view.sort.toggle(key);
        view.sort
    }

    pub fn view_state(&self) -> ViewState {
        self.view.read().clone()
    }

    /// Render the table from the stored view state
    pub fn view(&self) -> ViewResponse {
        self.view_with(&ViewQuery::default())
    }

    /// Render the table, letting `query` override the stored view state
    pub fn view_with(&self, query: &ViewQuery) -> ViewResponse {
        let stored = self.view_state();
        let search_term = query.search.clone().unwrap_or(stored.search_term);
        let sort_key = query.sort.unwrap_or(stored.sort.key);
        let sort_direction = query.direction.unwrap_or(stored.sort.direction);

        let state = self.store.snapshot();
        let rows: Vec<AssetRow> = derive_view(&state.records, &search_term, sort_key, sort_direction)
            .iter()
            .map(|record| AssetRow::from_record(record, &self.icon_url_template))
            .collect();

        let error = match (state.status, state.error) {
            (FetchStatus::Failed, Some(e)) => Some(format!("Error fetching data: {}", e)),
            (FetchStatus::Failed, None) => Some("Error fetching data".to_string()),
            _ => None,
        };

        ViewResponse {
            placeholder: rows.is_empty().then(|| NO_DATA_PLACEHOLDER.to_string()),
            rows,
            total_records: state.records.len(),
            status: state.status,
            error,
            search_term,
            sort_key,
            sort_direction,
            updated_at: state.updated_at,
        }
    }

    /// Row click: fetch the asset's details and open the dialog on them
    pub async fn open_editor(&self, id: &str) -> Result<AssetRecord, DashboardError> {
        let ticket = self.dialog.lock().begin_select(id);
        let result = self.source.fetch_asset(id).await;
        self.dialog.lock().complete_select(&ticket, result)
    }

    pub fn apply_draft_patch(&self, patch: &DraftPatch) -> Result<AssetRecord, DashboardError> {
        let mut dialog = self.dialog.lock();
        let edits = patch.edits();
        if edits.is_empty() && !dialog.is_open() {
            return Err(DashboardError::DialogClosed);
        }
        let mut draft = None;
        for (field, value) in edits {
            draft = Some(dialog.edit(field, value)?.clone());
        }
        match draft {
            Some(draft) => Ok(draft),
            None => dialog
                .to_response()
                .draft
                .ok_or(DashboardError::DialogClosed),
        }
    }

    /// Apply the draft to the store and close the dialog. The flag is false
    /// when the record vanished from the store while the dialog was open.
    pub fn submit_edit(&self) -> Result<(bool, AssetRecord), DashboardError> {
        let draft = self.dialog.lock().submit()?;
        let updated = self.store.update_one(&draft);
        Ok((updated, draft))
    }

    pub fn cancel_edit(&self) {
        self.dialog.lock().cancel();
    }

    pub fn dialog(&self) -> DialogResponse {
        self.dialog.lock().to_response()
    }
}
