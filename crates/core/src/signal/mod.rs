pub mod entity;
pub mod error;

pub use entity::{Direction, Market, SignalType, UnifiedSignal, MARKET_WIDE_ASSET};
pub use error::SignalError;
