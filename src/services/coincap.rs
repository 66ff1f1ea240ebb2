use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::models::asset::{dedup_by_id, AssetRecord};

/// Where the dashboard gets its assets from
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Full asset list. A payload without an array in `data` yields an empty list.
    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, DashboardError>;

    /// Detail for a single asset
    async fn fetch_asset(&self, id: &str) -> Result<AssetRecord, DashboardError>;

    /// Forget any cached list so the next fetch goes to the network
    async fn invalidate(&self) {}
}

const LIST_CACHE_KEY: &str = "assets";

#[derive(Clone)]
pub struct CoinCapService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    // None when the freshness window is zero
    cache: Option<Arc<Cache<String, Vec<AssetRecord>>>>,
}

impl CoinCapService {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        stale_after: Duration,
        request_timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        let cache = (!stale_after.is_zero()).then(|| {
            Arc::new(
                Cache::builder()
                    .max_capacity(1) // only the list is cached
                    .time_to_live(stale_after)
                    .build(),
            )
        });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            cache,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.stale_after,
            config.request_timeout,
        )
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url).header("accept", "application/json");
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn fetch_assets_uncached(&self) -> Result<Vec<AssetRecord>, DashboardError> {
        tracing::info!("Fetching asset list from CoinCap");

        let url = format!("{}/assets", self.base_url);
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| DashboardError::Fetch(format!("request to CoinCap failed: {}", e)))?;

        let body = read_json(response).await.map_err(DashboardError::Fetch)?;
        let assets = parse_asset_list(body);

        tracing::info!("Fetched {} assets from CoinCap", assets.len());

        Ok(assets)
    }
}

#[async_trait]
impl AssetSource for CoinCapService {
    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, DashboardError> {
        let Some(cache) = &self.cache else {
            return self.fetch_assets_uncached().await;
        };

        if cache.contains_key(LIST_CACHE_KEY) {
            tracing::debug!("Cache hit for asset list");
        }

        // Concurrent callers share one in-flight request
        cache
            .try_get_with(LIST_CACHE_KEY.to_string(), self.fetch_assets_uncached())
            .await
            .map_err(|e| (*e).clone())
    }

    async fn fetch_asset(&self, id: &str) -> Result<AssetRecord, DashboardError> {
        tracing::info!("Fetching details for '{}' from CoinCap", id);

        let detail_error = |reason: String| DashboardError::DetailFetch {
            id: id.to_string(),
            reason,
        };

        let url = asset_url(&self.base_url, id).map_err(detail_error)?;
        let response = self
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| detail_error(format!("request to CoinCap failed: {}", e)))?;

        let body = read_json(response).await.map_err(detail_error)?;

        parse_asset_detail(body)
            .ok_or_else(|| detail_error("response did not contain an asset".to_string()))
    }

    async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(LIST_CACHE_KEY).await;
            tracing::debug!("Invalidated cached asset list");
        }
    }
}

async fn read_json(response: Response) -> Result<Value, String> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("CoinCap API error {}: {}", status, error_text));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| format!("malformed CoinCap response: {}", e))
}

/// `{base}/assets/{id}` with `id` encoded as a single path segment
fn asset_url(base_url: &str, id: &str) -> Result<Url, String> {
    let mut url = Url::parse(base_url).map_err(|e| format!("invalid CoinCap base URL: {}", e))?;
    url.path_segments_mut()
        .map_err(|_| format!("CoinCap base URL cannot take a path: {}", base_url))?
        .pop_if_empty()
        .push("assets")
        .push(id);
    Ok(url)
}

/// Pull the asset array out of a list response. Elements that are not
/// usable asset objects are skipped, as are repeats of an id already seen.
pub fn parse_asset_list(body: Value) -> Vec<AssetRecord> {
    let items = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::warn!("CoinCap list response has no asset array; treating as empty");
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!("CoinCap list response is not an object; treating as empty");
            return Vec::new();
        }
    };

    let records = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<AssetRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping unusable asset entry: {}", e);
                None
            }
        })
        .collect();
    dedup_by_id(records)
}

/// Detail responses come wrapped in a `data` envelope, but a bare asset
/// object is accepted too
pub fn parse_asset_detail(body: Value) -> Option<AssetRecord> {
    let inner = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Object(_)) => data,
            Some(other) => {
                map.insert("data".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        _ => return None,
    };

    serde_json::from_value(inner).ok()
}
