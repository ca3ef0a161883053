// Order execution, position tracking and the tick-processing session
pub mod executor;
pub mod position;
pub mod price_feed;
pub mod price_window;
pub mod session;
pub mod trade_log;

pub use executor::{submit_order, AccountQuery, ExecutionAdapter};
pub use position::{Position, PositionState};
pub use price_feed::{BinanceTradeFeed, BINANCE_STREAM_BASE, BINANCE_TESTNET_STREAM_BASE};
pub use price_window::{PriceWindow, DEFAULT_WINDOW_CAPACITY};
pub use session::{SessionConfig, SessionStats, TickOutcome, TradingSession};
pub use trade_log::{MemoryTradeLog, TradeLog};
