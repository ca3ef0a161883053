pub mod binance;

pub use binance::{AssetBalance, BinanceClient, BINANCE_API_BASE, BINANCE_TESTNET_API_BASE};
