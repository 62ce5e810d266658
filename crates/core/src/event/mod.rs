pub mod entity;
pub mod error;

pub use entity::{EventSource, EventType, MarketScope, RawMarketEvent};
pub use error::EventError;
