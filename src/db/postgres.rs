use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

use crate::execution::TradeLog;
use crate::models::{TradeRecord, TradeSide};

/// Postgres-backed trade history
pub struct PostgresTradeLog {
    pool: PgPool,
}

impl PostgresTradeLog {
    /// Connect to Postgres and run migrations
    ///
    /// # Arguments
    /// * `database_url` - Postgres connection URL
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        tracing::info!("Connected to Postgres at {}", database_url);

        Ok(Self { pool })
    }

    /// Save one trade
    pub async fn save_trade(&self, record: &TradeRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trades (id, side, symbol, quantity, price, executed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(side_to_str(record.side))
        .bind(&record.symbol)
        .bind(record.quantity)
        .bind(record.price)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Saved trade {} for {} to Postgres", record.id, record.symbol);

        Ok(())
    }

    /// Load the trade history for a symbol, oldest first
    pub async fn load_trades(&self, symbol: &str) -> anyhow::Result<Vec<TradeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, side, symbol, quantity, price, executed_at
            FROM trades
            WHERE symbol = $1
            ORDER BY executed_at ASC
            "#,
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let side: String = row.get("side");
                let quantity: Decimal = row.get("quantity");
                let price: Decimal = row.get("price");
                let executed_at: DateTime<Utc> = row.get("executed_at");
                let id: Uuid = row.get("id");

                Ok(TradeRecord {
                    id,
                    side: side_from_str(&side)?,
                    symbol: row.get("symbol"),
                    quantity,
                    price,
                    timestamp: executed_at,
                })
            })
            .collect()
    }

    #[cfg(test)]
    pub async fn clear_trades(&self, symbol: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM trades WHERE symbol = $1")
            .bind(symbol)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TradeLog for PostgresTradeLog {
    async fn append(&self, record: &TradeRecord) -> anyhow::Result<()> {
        self.save_trade(record).await
    }
}

fn side_to_str(side: TradeSide) -> &'static str {
    match side {
        TradeSide::Buy => "buy",
        TradeSide::Sell => "sell",
    }
}

fn side_from_str(side: &str) -> anyhow::Result<TradeSide> {
    match side {
        "buy" => Ok(TradeSide::Buy),
        "sell" => Ok(TradeSide::Sell),
        other => anyhow::bail!("Unknown trade side in database: {}", other),
    }
}
