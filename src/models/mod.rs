use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TickError;

/// A single price observation taken from the trade stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self { timestamp, price }
    }
}

/// Raw exchange stream event (only the fields we care about)
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "e")]
    event_type: Option<String>,
    #[serde(rename = "T")]
    trade_time_ms: Option<i64>,
    #[serde(rename = "p")]
    price: Option<serde_json::Value>,
}

/// One trade event delivered by the market feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub timestamp_ms: i64,
    pub price: Decimal,
}

impl Tick {
    /// Parse a raw feed message.
    ///
    /// Returns `Ok(None)` for well-formed events that are not trades.
    pub fn parse(raw: &str) -> Result<Option<Tick>, TickError> {
        let event: StreamEvent = serde_json::from_str(raw)
            .map_err(|e| TickError::Malformed(format!("invalid JSON: {}", e)))?;

        if event.event_type.as_deref() != Some("trade") {
            return Ok(None);
        }

        let timestamp_ms = event
            .trade_time_ms
            .ok_or_else(|| TickError::Malformed("trade event without timestamp".to_string()))?;

        let price = match event.price {
            Some(serde_json::Value::String(s)) => Decimal::from_str(&s)
                .map_err(|e| TickError::Malformed(format!("bad price {:?}: {}", s, e)))?,
            Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
                .map_err(|e| TickError::Malformed(format!("bad price {}: {}", n, e)))?,
            Some(other) => {
                return Err(TickError::Malformed(format!("bad price {}", other)));
            }
            None => {
                return Err(TickError::Malformed("trade event without price".to_string()));
            }
        };

        Ok(Some(Tick {
            timestamp_ms,
            price,
        }))
    }

    /// Convert into a window sample, using the exchange trade time
    pub fn to_sample(&self) -> Result<PriceSample, TickError> {
        let timestamp = Utc
            .timestamp_millis_opt(self.timestamp_ms)
            .single()
            .ok_or_else(|| {
                TickError::Malformed(format!("timestamp out of range: {}", self.timestamp_ms))
            })?;

        Ok(PriceSample::new(timestamp, self.price))
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Exchange wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// One confirmed execution slice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Confirmed result of a market order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReport {
    pub fills: Vec<Fill>,
}

impl OrderReport {
    /// Price of the first fill, used as the representative execution price
    pub fn fill_price(&self) -> Option<Decimal> {
        self.fills.first().map(|f| f.price)
    }

    /// Total quantity across all fills
    pub fn filled_quantity(&self) -> Decimal {
        self.fills.iter().map(|f| f.quantity).sum()
    }
}

/// Append-only record of a completed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub side: TradeSide,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    pub fn new(side: TradeSide, symbol: &str, quantity: Decimal, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            symbol: symbol.to_string(),
            quantity,
            price,
            timestamp: Utc::now(),
        }
    }
}
