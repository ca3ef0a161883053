use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::TradeRecord;

/// Append-only sink for completed trades
///
/// A failed append is reported by the caller and never undoes the trade.
#[async_trait]
pub trait TradeLog: Send + Sync {
    async fn append(&self, record: &TradeRecord) -> anyhow::Result<()>;
}

/// In-memory trade log
///
/// Used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryTradeLog {
    records: Mutex<Vec<TradeRecord>>,
}

impl MemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records appended so far
    pub fn records(&self) -> Vec<TradeRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl TradeLog for MemoryTradeLog {
    async fn append(&self, record: &TradeRecord) -> anyhow::Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| anyhow::anyhow!("trade log lock poisoned: {}", e))?;
        records.push(record.clone());
        Ok(())
    }
}
