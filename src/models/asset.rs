use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;

use crate::models::dashboard::SortKey;

/// One tradable asset as delivered by the CoinCap `/assets` endpoint.
///
/// Only `id` is required. Everything else is kept as loosely as the upstream
/// sends it: scalar values are coerced to strings, anything else is treated
/// as absent, and unknown fields ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>, // rank, supply, marketCapUsd, ...
}

impl AssetRecord {
    pub fn new(id: &str, name: &str, symbol: &str, price_usd: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            symbol: Some(symbol.to_string()),
            price_usd: Some(price_usd.to_string()),
            extra: Map::new(),
        }
    }

    /// Value of the column a table is sorted by
    pub fn field(&self, key: SortKey) -> Option<&str> {
        match key {
            SortKey::Name => self.name.as_deref(),
            SortKey::PriceUsd => self.price_usd.as_deref(),
        }
    }

    /// Overlay every field present in `patch` onto this record.
    /// The id is never changed.
    pub fn merge_from(&mut self, patch: &AssetRecord) {
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        if let Some(symbol) = &patch.symbol {
            self.symbol = Some(symbol.clone());
        }
        if let Some(price) = &patch.price_usd {
            self.price_usd = Some(price.clone());
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Icon URL built from `template` by substituting `{symbol}` with the
    /// lower-cased symbol
    pub fn icon_url(&self, template: &str) -> Option<String> {
        self.symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| template.replace("{symbol}", &s.to_lowercase()))
    }

    /// Price formatted for the table: two decimals, or "N/A" if it doesn't parse
    pub fn display_price(&self) -> String {
        self.price_usd
            .as_deref()
            .and_then(parse_price)
            .map(|p| {
                format!(
                    "{:.2}",
                    p.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                )
            })
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Parse a string-encoded price. Accepts plain and scientific notation.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_string(&value))
}

fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_string(&value)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| de::Error::custom("asset id must be a non-empty string or number"))
}

/// Coarse outcome of the last list fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Succeeded,
    Failed,
}

/// Process-wide asset collection; this is what gets persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCollectionState {
    pub records: Vec<AssetRecord>, // arrival order of the last successful fetch
    pub status: FetchStatus,
    pub error: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Drop records whose id was already seen. The first occurrence wins and
/// arrival order is kept.
pub fn dedup_by_id(records: Vec<AssetRecord>) -> Vec<AssetRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| {
            let first = seen.insert(record.id.clone());
            if !first {
                tracing::warn!("Dropping duplicate asset id '{}'", record.id);
            }
            first
        })
        .collect()
}
