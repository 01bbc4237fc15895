//! Limit order book reconstruction.
//!
//! Leaf-first: [`OrderRegistry`] (id → order), [`PriceLevel`] (FIFO queue at
//! one price), [`PriceLevelLadder`] (one side, best first) and
//! [`OrderBookEngine`] (one instrument's book).

pub mod engine;
pub mod ladder;
pub mod price_level;
pub mod registry;

pub use engine::{Applied, EngineStats, OrderBookEngine};
pub use ladder::PriceLevelLadder;
pub use price_level::PriceLevel;
pub use registry::OrderRegistry;
