// Trade history persistence
pub mod postgres;

pub use postgres::PostgresTradeLog;
