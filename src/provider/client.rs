use crate::config::Config;
use crate::models::{Coin, RiskTarget, TxQuery};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("MISTTRACK_API_KEY environment variable not set.")]
    MissingApiKey,

    #[error("Provider request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(err)
        }
    }
}

impl ProviderError {
    /// Worth retrying within the same call
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout => true,
            ProviderError::Http(e) => e.is_connect() || e.is_request(),
            ProviderError::Status { status, .. } => *status >= 500 || *status == 429,
            ProviderError::MissingApiKey | ProviderError::Decode(_) => false,
        }
    }

    /// Error-shaped result handed to callers in place of provider data
    pub fn into_payload(self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// Read-only queries against the blockchain analytics provider
#[async_trait]
pub trait AnalyticsProvider: Send + Sync {
    async fn status(&self) -> Result<Value, ProviderError>;

    async fn address_labels(&self, coin: Coin, address: &str) -> Result<Value, ProviderError>;

    async fn address_overview(&self, coin: Coin, address: &str) -> Result<Value, ProviderError>;

    async fn risk_score(&self, coin: Coin, target: &RiskTarget) -> Result<Value, ProviderError>;

    async fn transactions_investigation(
        &self,
        coin: Coin,
        address: &str,
        query: &TxQuery,
    ) -> Result<Value, ProviderError>;

    async fn address_actions(&self, coin: Coin, address: &str) -> Result<Value, ProviderError>;

    async fn address_profile(&self, coin: Coin, address: &str) -> Result<Value, ProviderError>;
}

/// HTTP client for the MistTrack open API
pub struct MistTrackClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: usize,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl MistTrackClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()?;

        let limiter = config
            .provider_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        if config.api_key.is_none() {
            warn!("MISTTRACK_API_KEY is not set; every provider call will return an error");
        }

        info!(
            "Initializing analytics client with endpoint: {}, timeout: {:?}, retries: {}",
            config.provider_base_url, config.provider_timeout, config.provider_max_retries
        );

        Ok(Self {
            http,
            base_url: config.provider_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.provider_max_retries,
            limiter,
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)
    }

    /// GET `endpoint` with `params` plus the API key, retrying transient failures
    async fn get(&self, endpoint: &str, mut params: Vec<(&'static str, String)>) -> Result<Value, ProviderError> {
        let api_key = self.api_key()?;
        params.push(("api_key", api_key.to_string()));
        let url = format!("{}/{}", self.base_url, endpoint);

        let request = || async {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }
            let response = self.http.get(&url).query(&params).send().await?;
            decode(response).await
        };

        request
            .retry(self.backoff())
            .when(ProviderError::is_transient)
            .notify(|err, delay| warn!("Retrying {} in {:?}: {}", endpoint, delay, err))
            .await
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.max_retries)
    }
}

async fn decode(response: reqwest::Response) -> Result<Value, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
}

fn address_params(coin: Coin, address: &str) -> Vec<(&'static str, String)> {
    vec![("coin", coin.to_string()), ("address", address.to_string())]
}

#[async_trait]
impl AnalyticsProvider for MistTrackClient {
    async fn status(&self) -> Result<Value, ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/status", self.base_url);
        debug!("Checking provider status");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, api_key)
            .send()
            .await?;
        decode(response).await
    }

    async fn address_labels(&self, coin: Coin, address: &str) -> Result<Value, ProviderError> {
        info!("Fetching labels for {} {}", coin, address);
        self.get("address_labels", address_params(coin, address)).await
    }

    async fn address_overview(&self, coin: Coin, address: &str) -> Result<Value, ProviderError> {
        info!("Fetching overview for {} {}", coin, address);
        self.get("address_overview", address_params(coin, address)).await
    }

    async fn risk_score(&self, coin: Coin, target: &RiskTarget) -> Result<Value, ProviderError> {
        let mut params = vec![("coin", coin.to_string())];
        match target {
            RiskTarget::Address(address) => {
                info!("Fetching risk score for {} address {}", coin, address);
                params.push(("address", address.clone()));
            }
            RiskTarget::Transaction(txid) => {
                info!("Fetching risk score for {} transaction {}", coin, txid);
                params.push(("txid", txid.clone()));
            }
        }
        self.get("risk_score", params).await
    }

    async fn transactions_investigation(
        &self,
        coin: Coin,
        address: &str,
        query: &TxQuery,
    ) -> Result<Value, ProviderError> {
        info!(
            "Fetching {} transactions for {} {} (page {})",
            query.tx_type, coin, address, query.page
        );
        let mut params = address_params(coin, address);
        params.push(("type", query.tx_type.to_string()));
        params.push(("page", query.page.to_string()));
        let (start, end) = query.time_range();
        if let Some(start) = start {
            params.push(("start_timestamp", start.to_string()));
        }
        if let Some(end) = end {
            params.push(("end_timestamp", end.to_string()));
        }
        self.get("transactions_investigation", params).await
    }

    async fn address_actions(&self, coin: Coin, address: &str) -> Result<Value, ProviderError> {
        info!("Fetching actions for {} {}", coin, address);
        self.get("address_action", address_params(coin, address)).await
    }

    async fn address_profile(&self, coin: Coin, address: &str) -> Result<Value, ProviderError> {
        info!("Fetching profile for {} {}", coin, address);
        self.get("address_trace", address_params(coin, address)).await
    }
}
