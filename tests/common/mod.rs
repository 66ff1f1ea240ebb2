use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use coin_dashboard::{
    build_router,
    error::DashboardError,
    models::asset::AssetRecord,
    services::{asset_store::AssetStore, coincap::AssetSource, dashboard::Dashboard},
    AppState,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tower::ServiceExt;

pub const ICON_TEMPLATE: &str = "https://assets.coincap.io/assets/icons/{symbol}@2x.png";

/// Asset source with scripted list responses and a fixed detail catalogue
pub struct FakeSource {
    lists: Mutex<VecDeque<Result<Vec<AssetRecord>, DashboardError>>>,
    details: Vec<AssetRecord>,
}

impl FakeSource {
    pub fn new(lists: Vec<Result<Vec<AssetRecord>, DashboardError>>) -> Self {
        Self {
            lists: Mutex::new(lists.into()),
            details: sample_assets(),
        }
    }
}

#[async_trait]
impl AssetSource for FakeSource {
    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, DashboardError> {
        self.lists
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(DashboardError::Fetch("no scripted response".to_string())))
    }

    async fn fetch_asset(&self, id: &str) -> Result<AssetRecord, DashboardError> {
        self.details
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| DashboardError::DetailFetch {
                id: id.to_string(),
                reason: "CoinCap API error 404 Not Found".to_string(),
            })
    }
}

pub fn sample_assets() -> Vec<AssetRecord> {
    vec![
        AssetRecord::new("a", "Bitcoin", "BTC", "50000.4"),
        AssetRecord::new("b", "Ether", "ETH", "3000.1"),
    ]
}

/// Router over a dashboard that has already loaded the first scripted list
#[allow(dead_code)]
pub async fn build_test_router(lists: Vec<Result<Vec<AssetRecord>, DashboardError>>) -> (Router, Arc<Dashboard>) {
    build_test_router_with_store(AssetStore::new(), lists).await
}

pub async fn build_test_router_with_store(
    store: AssetStore,
    lists: Vec<Result<Vec<AssetRecord>, DashboardError>>,
) -> (Router, Arc<Dashboard>) {
    let dashboard = Arc::new(Dashboard::new(
        store,
        Arc::new(FakeSource::new(lists)),
        ICON_TEMPLATE.to_string(),
    ));
    let _ = dashboard.load().await;

    let router = build_router(AppState {
        dashboard: dashboard.clone(),
    });
    (router, dashboard)
}

/// Send one request and decode the JSON body
pub async fn send(router: &Router, request: Request<Body>) -> (axum::http::StatusCode, Value) {
    let response: Response<Body> = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
