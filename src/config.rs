// Configuration for:
// - Analytics provider endpoint and API key (from environment variables)
// - Server listening address/port
// - Provider timeout, retry and rate limit settings
// - Graph rendering and artifact storage

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openapi.misttrack.io/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub provider_base_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub provider_timeout: Duration,
    pub provider_max_retries: usize,
    pub provider_rate_limit: Option<u32>,
    pub graphviz_bin: String,
    pub artifact_root: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_key = env::var("MISTTRACK_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let provider_base_url = env::var("MISTTRACK_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);
        let provider_timeout = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let provider_max_retries = env::var("PROVIDER_MAX_RETRIES")
            .map(|v| v.parse().unwrap_or(2))
            .unwrap_or(2);
        let provider_rate_limit = env::var("PROVIDER_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let graphviz_bin = env::var("GRAPHVIZ_BIN").unwrap_or_else(|_| "dot".to_string());
        let artifact_root = env::var("ARTIFACT_ROOT").ok().map(PathBuf::from);

        Self {
            api_key,
            provider_base_url,
            server_host,
            server_port,
            provider_timeout,
            provider_max_retries,
            provider_rate_limit,
            graphviz_bin,
            artifact_root,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            provider_base_url: DEFAULT_BASE_URL.to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            provider_timeout: Duration::from_secs(30),
            provider_max_retries: 2,
            provider_rate_limit: None,
            graphviz_bin: "dot".to_string(),
            artifact_root: None,
        }
    }
}
