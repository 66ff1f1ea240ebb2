use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::asset::{AssetRecord, FetchStatus};

/// Column the asset table can be sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "priceUsd")]
    PriceUsd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    /// Column-header click. Clicking the active column while ascending flips
    /// it to descending; every other click sorts the clicked column ascending.
    pub fn toggle(self, clicked: SortKey) -> Self {
        let is_asc = self.key == clicked && self.direction == SortDirection::Ascending;
        Self {
            key: clicked,
            direction: if is_asc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        }
    }
}

/// Transient table state, never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search_term: String,
    pub sort: SortState,
}

/// Query parameters for GET /api/view. Any value given overrides the
/// stored view state for this request only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    pub direction: Option<SortDirection>,
}

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRow {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub price_usd: String, // formatted with two decimals
}

impl AssetRow {
    pub fn from_record(record: &AssetRecord, icon_template: &str) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone().unwrap_or_default(),
            symbol: record.symbol.clone().unwrap_or_default(),
            icon_url: record.icon_url(icon_template),
            price_usd: record.display_price(),
        }
    }
}

/// Response structure for the table view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub rows: Vec<AssetRow>,
    pub total_records: usize,
    pub status: FetchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>, // "No data available" when rows is empty
    pub search_term: String,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

/// Editable fields of the edit dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Name,
    PriceUsd,
}

/// Body of PATCH /api/dialog/draft
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPatch {
    pub name: Option<String>,
    pub price_usd: Option<String>,
}

impl DraftPatch {
    pub fn edits(&self) -> Vec<(EditableField, String)> {
        let mut edits = Vec::new();
        if let Some(name) = &self.name {
            edits.push((EditableField::Name, name.clone()));
        }
        if let Some(price) = &self.price_usd {
            edits.push((EditableField::PriceUsd, price.clone()));
        }
        edits
    }
}

/// Response structure for the edit dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResponse {
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<AssetRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<AssetRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_id: Option<String>, // detail fetch in flight
}

/// Response for edit submit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub updated: bool,
    pub record: AssetRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
