//! Matcher REST client — `MatcherHttp`.
//!
//! One method per matcher endpoint, returning domain types directly (the
//! matcher serializes them in the same shape the store holds). Read
//! endpoints retry on transient failures; order mutations never do.

use crate::domain::market::Market;
use crate::domain::order::{Order, PlaceOrderRequest, PlaceOrderResponse};
use crate::domain::orderbook::BookSnapshot;
use crate::domain::trade::Trade;
use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};
use crate::http::Matcher;
use crate::shared::{MarketId, OrderId, WalletStr};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error body the matcher returns on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the matcher REST API.
#[derive(Clone)]
pub struct MatcherHttp {
    base_url: String,
    client: Client,
}

impl MatcherHttp {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    // ── Markets ──────────────────────────────────────────────────────────

    pub async fn get_markets(&self) -> Result<Vec<Market>, HttpError> {
        let url = format!("{}/api/markets", self.base_url);
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn get_market(&self, market_id: &MarketId) -> Result<Market, HttpError> {
        let url = format!("{}/api/markets/{}", self.base_url, market_id);
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Orderbook / trades ───────────────────────────────────────────────

    pub async fn get_orderbook(
        &self,
        market_id: &MarketId,
        depth: Option<u32>,
    ) -> Result<BookSnapshot, HttpError> {
        let mut url = format!("{}/api/markets/{}/orderbook", self.base_url, market_id);
        if let Some(d) = depth {
            url = format!("{}?depth={}", url, d);
        }
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn get_trades(
        &self,
        market_id: &MarketId,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, HttpError> {
        let mut url = format!("{}/api/markets/{}/trades", self.base_url, market_id);
        if let Some(l) = limit {
            url = format!("{}?limit={}", url, l);
        }
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Orders ───────────────────────────────────────────────────────────

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, HttpError> {
        let url = format!("{}/api/orders/{}", self.base_url, order_id);
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn get_user_orders(
        &self,
        wallet: &WalletStr,
        market_id: Option<&MarketId>,
    ) -> Result<Vec<Order>, HttpError> {
        let mut url = format!("{}/api/users/{}/orders", self.base_url, wallet);
        if let Some(m) = market_id {
            url = format!("{}?market_id={}", url, m);
        }
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::GET, url, None::<&()>, retry)
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let config = match &retry {
            RetryPolicy::None => {
                return self.do_request(&method, url, body).await;
            }
            RetryPolicy::Idempotent => RetryConfig::idempotent(),
            RetryPolicy::Custom(c) => c.clone(),
        };

        let mut attempt = 0;
        loop {
            match self.do_request::<T, B>(&method, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let should_retry = match &e {
                        HttpError::ServerError { status, .. } => {
                            config.retryable_statuses.contains(status)
                        }
                        HttpError::RateLimited => true,
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => {
                            re.is_connect() || re.is_timeout() || re.is_request()
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(e);
                    }
                    if attempt >= config.max_retries {
                        return Err(HttpError::MaxRetriesExceeded {
                            attempts: attempt + 1,
                            last_error: e.to_string(),
                        });
                    }

                    let delay = config.delay_for_attempt(attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request to {}",
                        url
                    );
                    futures_timer::Delay::new(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, HttpError> {
        let mut req = self.client.request(method.clone(), url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<T>().await?;
            return Ok(parsed);
        }

        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body_text)
            .map(|b| b.error)
            .unwrap_or(body_text);

        match status_code {
            404 => Err(HttpError::NotFound(message)),
            429 => Err(HttpError::RateLimited),
            400..=499 => Err(HttpError::BadRequest(message)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: message,
            }),
        }
    }
}

#[async_trait]
impl Matcher for MatcherHttp {
    /// Register an escrowed order with the matcher. Never retried: an
    /// ambiguous outcome here is the coordinator's problem, not ours.
    async fn place_order(
        &self,
        request: &PlaceOrderRequest,
    ) -> Result<PlaceOrderResponse, HttpError> {
        let url = format!("{}/api/orders", self.base_url);
        self.request_with_retry(reqwest::Method::POST, url.as_str(), Some(request), RetryPolicy::None)
            .await
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, HttpError> {
        let url = format!("{}/api/orders/{}", self.base_url, order_id);
        self.request_with_retry(reqwest::Method::DELETE, url.as_str(), None::<&()>, RetryPolicy::None)
            .await
    }
}
