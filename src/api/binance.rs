use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ExecutionError;
use crate::execution::{AccountQuery, ExecutionAdapter};
use crate::models::{Fill, OrderReport, TradeSide};

pub const BINANCE_API_BASE: &str = "https://api.binance.com";
pub const BINANCE_TESTNET_API_BASE: &str = "https://testnet.binance.vision";

const RECV_WINDOW_MS: u64 = 5000;
const REQUESTS_PER_SECOND: u32 = 10;
const HTTP_TIMEOUT_SECS: u64 = 30;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Binance spot REST client
///
/// Cloneable; all clones share the same rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    rate_limiter: Arc<BinanceRateLimiter>,
}

/// Error body returned by the API on 4xx/5xx
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// Response from POST /api/v3/order with `newOrderRespType=FULL`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: i64,
    status: String,
    #[serde(default)]
    fills: Vec<OrderFill>,
}

#[derive(Debug, Deserialize)]
struct OrderFill {
    price: Decimal,
    qty: Decimal,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: Decimal,
}

impl BinanceClient {
    /// Create a client against `base_url`
    ///
    /// Credentials are only needed for signed endpoints (orders, balances).
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        let quota = Quota::per_second(NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Client for the spot testnet
    pub fn testnet(api_key: Option<String>, api_secret: Option<String>) -> anyhow::Result<Self> {
        Self::new(BINANCE_TESTNET_API_BASE, api_key, api_secret)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Place a market order and wait for the FULL response
    pub async fn order_market(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<OrderReport, ExecutionError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("newOrderRespType", "FULL".to_string()),
        ];

        let response = self.signed(Method::POST, "/api/v3/order", &params).await?;
        let order: OrderResponse = response.json().await?;

        tracing::debug!(
            order_id = order.order_id,
            status = %order.status,
            fills = order.fills.len(),
            "Market order acknowledged"
        );

        if order.fills.is_empty() {
            tracing::warn!(
                "Order {} for {} came back {} without fills",
                order.order_id,
                symbol,
                order.status
            );
            return Err(ExecutionError::NoFills);
        }

        Ok(OrderReport {
            fills: order
                .fills
                .into_iter()
                .map(|f| Fill {
                    price: f.price,
                    quantity: f.qty,
                })
                .collect(),
        })
    }

    /// All balances on the account
    pub async fn get_account_balances(&self) -> Result<Vec<AssetBalance>, ExecutionError> {
        let response = self.signed(Method::GET, "/api/v3/account", &[]).await?;
        let account: AccountResponse = response.json().await?;
        Ok(account.balances)
    }

    /// Free balance of one asset
    pub async fn get_asset_balance(&self, asset: &str) -> anyhow::Result<Decimal> {
        let balances = self
            .get_account_balances()
            .await
            .context("Failed to fetch account balances")?;

        balances
            .into_iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
            .map(|b| b.free)
            .ok_or_else(|| anyhow::anyhow!("Asset {} not found on account", asset))
    }

    /// Latest traded price for a symbol (public endpoint)
    pub async fn get_symbol_price(&self, symbol: &str) -> anyhow::Result<Decimal> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send ticker request")?;
        let response = Self::check_status(response).await?;
        let ticker: TickerPrice = response
            .json()
            .await
            .context("Failed to parse ticker response")?;

        Ok(ticker.price)
    }

    /// Send a signed request
    ///
    /// Appends `recvWindow`, `timestamp` and the HMAC-SHA256 `signature` to the query.
    async fn signed(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Response, ExecutionError> {
        let (api_key, api_secret) = match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => (key, secret),
            _ => return Err(ExecutionError::MissingCredentials),
        };

        let mut query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        query.push(format!("recvWindow={}", RECV_WINDOW_MS));
        query.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        let query = query.join("&");

        let signature = sign(api_secret, &query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", api_key)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Turn a non-2xx response into an execution error
    async fn check_status(response: Response) -> Result<Response, ExecutionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        match serde_json::from_str::<ApiError>(&body) {
            Ok(err) => Err(ExecutionError::Rejected {
                code: err.code,
                message: err.msg,
            }),
            Err(_) => Err(ExecutionError::Transport(format!("HTTP {}: {}", status, body))),
        }
    }
}

/// Hex-encoded HMAC-SHA256 of the query string
fn sign(secret: &str, query: &str) -> Result<String, ExecutionError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| ExecutionError::InvalidResponse(format!("invalid API secret: {}", e)))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl ExecutionAdapter for BinanceClient {
    async fn buy(&self, symbol: &str, quantity: Decimal) -> Result<OrderReport, ExecutionError> {
        self.order_market(symbol, TradeSide::Buy, quantity).await
    }

    async fn sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderReport, ExecutionError> {
        self.order_market(symbol, TradeSide::Sell, quantity).await
    }
}

#[async_trait]
impl AccountQuery for BinanceClient {
    async fn get_balance(&self, asset: &str) -> anyhow::Result<Decimal> {
        self.get_asset_balance(asset).await
    }
}
