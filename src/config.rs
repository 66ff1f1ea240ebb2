use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coincap.io/v2";
pub const DEFAULT_ICON_URL_TEMPLATE: &str = "https://assets.coincap.io/assets/icons/{symbol}@2x.png";

/// Runtime configuration, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub icon_url_template: String,
    pub state_file: PathBuf,
    /// How long a fetched asset list counts as fresh
    pub stale_after: Duration,
    pub request_timeout: Duration,
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            icon_url_template: DEFAULT_ICON_URL_TEMPLATE.to_string(),
            state_file: PathBuf::from("data/dashboard_state.json"),
            stale_after: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset, empty or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |key: &str, fallback: Duration| {
            get(key)
                .and_then(|v| match v.parse::<u64>() {
                    Ok(secs) => Some(Duration::from_secs(secs)),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid {}={:?}", key, v);
                        None
                    }
                })
                .unwrap_or(fallback)
        };

        Self {
            base_url: get("COINCAP_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: get("COINCAP_API_KEY"),
            icon_url_template: get("ICON_URL_TEMPLATE").unwrap_or(defaults.icon_url_template),
            state_file: get("STATE_FILE").map(PathBuf::from).unwrap_or(defaults.state_file),
            stale_after: secs("FETCH_STALE_SECS", defaults.stale_after),
            request_timeout: secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}
