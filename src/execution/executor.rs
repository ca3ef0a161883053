use async_trait::async_trait;
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;

use crate::error::ExecutionError;
use crate::models::{OrderReport, TradeSide};

/// Market order placement
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    async fn buy(&self, symbol: &str, quantity: Decimal) -> Result<OrderReport, ExecutionError>;

    async fn sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderReport, ExecutionError>;
}

/// Account balance lookup, used once to seed the session
#[async_trait]
pub trait AccountQuery: Send + Sync {
    async fn get_balance(&self, asset: &str) -> anyhow::Result<Decimal>;
}

/// Submit a market order, bounded by `limit`
///
/// A timeout is reported as an execution failure. So is a report without
/// fills or whose fills add up to nothing.
pub async fn submit_order(
    adapter: &dyn ExecutionAdapter,
    side: TradeSide,
    symbol: &str,
    quantity: Decimal,
    limit: Duration,
) -> Result<OrderReport, ExecutionError> {
    let report = match side {
        TradeSide::Buy => with_timeout(adapter.buy(symbol, quantity), limit).await?,
        TradeSide::Sell => with_timeout(adapter.sell(symbol, quantity), limit).await?,
    };

    if report.fill_price().is_none() || report.filled_quantity() <= Decimal::ZERO {
        return Err(ExecutionError::NoFills);
    }

    Ok(report)
}

async fn with_timeout<F>(order: F, limit: Duration) -> Result<OrderReport, ExecutionError>
where
    F: Future<Output = Result<OrderReport, ExecutionError>>,
{
    tokio::time::timeout(limit, order)
        .await
        .map_err(|_| ExecutionError::Timeout(limit))?
}
