// Trading strategy module
pub mod momentum;
pub mod signals;

pub use momentum::MomentumStrategy;
pub use signals::{decide, SignalConfig};
