//! # ITCH-LOB-Reconstructor
//!
//! Replays NASDAQ TotalView-ITCH 5.0 session files into per-instrument limit
//! order books, recording top-of-book snapshots and the trade tape as the
//! feed advances.
//!
//! ## Features
//!
//! - **Bounds-checked decoding**: every record is length-checked before any field is read
//! - **Pluggable message table**: register extra tags or override built-in layouts
//! - **Price-time priority**: FIFO queue per price level, best-first ladders
//! - **Atomic events**: a rejected event leaves the book untouched
//! - **Strict or lenient replay**: halt at the first bad event or record a warning and move on
//! - **zstd input**: compressed session files are streamed, never fully buffered
//!
//! ## Quick Start
//!
//! ### Driving one book by hand
//!
//! ```rust
//! use itch_lob_reconstructor::{EventKind, OrderBookEngine, Side};
//!
//! let mut book = OrderBookEngine::new(1).with_symbol("AAPL");
//! book.add_order(1, Side::Bid, 1_000_000, 100, 0).unwrap(); // $100.0000
//! book.add_order(2, Side::Ask, 1_000_100, 50, 1).unwrap();  // $100.0100
//!
//! let trade = book.execute_order(2, 20, None, 7, 2).unwrap();
//! assert_eq!(trade.price, 1_000_100);
//!
//! let snap = book.snapshot(3, EventKind::Execute, Side::Ask);
//! assert_eq!(snap.best_ask().unwrap().size, 30);
//! ```
//!
//! ### Replaying a session file
//!
//! ```ignore
//! use itch_lob_reconstructor::{export, FeedLoader, ReconstructionConfig, ReconstructionDriver};
//!
//! let loader = FeedLoader::new("data/01302019.NASDAQ_ITCH50.zst")?;
//! let config = ReconstructionConfig::default()
//!     .with_depth(5)
//!     .with_symbols(["AAPL", "MSFT"]);
//!
//! let result = ReconstructionDriver::new(config).run_reader(loader.open()?)?;
//! export::export_all("output".as_ref(), &result, 5)?;
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `Side`, `Order`, `Trade`, `Snapshot`, fixed-point `Price` |
//! | [`itch`] | Wire format: field readers, typed messages, record framing |
//! | [`lob`] | Book state: `OrderRegistry`, `PriceLevel`, `PriceLevelLadder`, `OrderBookEngine` |
//! | [`driver`] | Feed replay: `ReconstructionDriver`, `ReconstructionConfig` |
//! | [`loader`] | Raw and zstd session files |
//! | [`export`] | CSV output |
//! | [`warnings`] | Warning tracking: `WarningTracker`, `Warning`, `WarningCategory` |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `zstd` | ✅ | Read zstd-compressed session files |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod driver;
pub mod error;
pub mod export;
pub mod itch;
pub mod loader;
pub mod lob;
pub mod types;
pub mod warnings;

// Re-exports - Core types
pub use error::{IntegrityError, LobError, Result};
pub use types::{
    BookConsistency, BookLevel, EventKind, InstrumentId, Order, Price, Side, Snapshot, Trade,
    TradeKind, PRICE_SCALE,
};

// Re-exports - Wire format
pub use itch::{DecodedRecord, FeedDecoder, ItchEvent, MessageDecoder, RecordLayout, StreamDecoder};

// Re-exports - Book state
pub use lob::{Applied, EngineStats, OrderBookEngine, OrderRegistry, PriceLevel, PriceLevelLadder};

// Re-exports - Replay
pub use driver::{
    InstrumentHistory, IntegrityMode, Reconstruction, ReconstructionConfig, ReconstructionDriver,
    ReplayStats, SnapshotPolicy,
};

// Re-exports - Loading
pub use loader::{Compression, FeedLoader, IO_BUFFER_SIZE};

// Re-exports - Warnings
pub use warnings::{
    Warning, WarningCategory, WarningSummary, WarningTracker, WarningTrackerConfig,
};
