//! Core data types shared by the decoder, the book and the replay driver.
//!
//! Prices stay in the feed's fixed-point representation (`u32`, four implied
//! decimals) everywhere inside the crate, including the exported text.

use serde::{Deserialize, Serialize};

/// Fixed-point price: dollars × 10^4.
pub type Price = u32;

/// Implied scale of [`Price`].
pub const PRICE_SCALE: u32 = 10_000;

/// Instrument identifier: the feed's stock locate code.
pub type InstrumentId = u16;

/// Order side (bid or ask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'S',
    /// Non-directional (cross trades)
    None = b' ',
}

impl Side {
    /// Parse a buy/sell indicator byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'S' => Some(Side::Ask),
            _ => None,
        }
    }

    /// Convert to the feed's buy/sell indicator.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }

    /// Lowercase label used in tabular exports.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
            Side::None => "none",
        }
    }
}

/// Kind of book event, used to tag snapshots and export rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Add,
    Execute,
    Cancel,
    Delete,
    Replace,
    Trade,
    Administrative,
}

impl EventKind {
    /// Lowercase label used in tabular exports.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Add => "add",
            EventKind::Execute => "execute",
            EventKind::Cancel => "cancel",
            EventKind::Delete => "delete",
            EventKind::Replace => "replace",
            EventKind::Trade => "trade",
            EventKind::Administrative => "administrative",
        }
    }
}

/// Resting order as stored in the registry.
///
/// Price and side are authoritative here: execute, cancel and delete messages
/// only carry the order reference number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub instrument: InstrumentId,
    pub side: Side,
    pub price: Price,
    pub size: u32,
    /// Arrival sequence within the book (FIFO tie-break)
    pub sequence: u64,
    /// Timestamp of the add or replace that created this order
    pub timestamp: u64,
}

/// Where a trade record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeKind {
    /// Execution of a displayed order at its resting price
    Execution,
    /// Execution of a displayed order at an explicit price
    ExecutionWithPrice,
    /// Match against a non-displayed order; no visible book change
    Hidden,
    /// Opening/closing/halt cross; no visible book change
    Cross,
}

/// An executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Nanoseconds since midnight
    pub timestamp: u64,

    pub instrument: InstrumentId,

    /// Execution price (fixed-point, 4 decimals)
    pub price: Price,

    /// Shares executed
    pub size: u64,

    /// Side of the resting order (`Side::None` for crosses)
    pub passive_side: Side,

    /// Per-instrument trade counter, starting at 1
    pub sequence: u64,

    /// Book event ordinal of the producing event; same counter as [`Snapshot::sequence`]
    pub event_sequence: u64,

    /// Exchange match number
    pub match_number: u64,

    pub kind: TradeKind,

    /// Resting order that was executed, when the feed names one
    pub order_id: Option<u64>,

    /// Whether the execution should count toward volume statistics
    pub printable: bool,
}

/// Top-of-book consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookConsistency {
    /// Book is valid: best_bid < best_ask
    Valid,
    /// Book is empty (no quotes on one or both sides)
    Empty,
    /// Book is locked: best_bid == best_ask
    Locked,
    /// Book is crossed: best_bid > best_ask
    Crossed,
}

impl BookConsistency {
    /// Classify a pair of best prices.
    #[inline]
    pub fn classify(best_bid: Option<Price>, best_ask: Option<Price>) -> Self {
        match (best_bid, best_ask) {
            (Some(bid), Some(ask)) if bid < ask => BookConsistency::Valid,
            (Some(bid), Some(ask)) if bid == ask => BookConsistency::Locked,
            (Some(_), Some(_)) => BookConsistency::Crossed,
            _ => BookConsistency::Empty,
        }
    }
}

/// Aggregated view of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    /// Sum of resting shares at this price
    pub size: u64,
    /// Number of resting orders at this price
    pub orders: usize,
}

/// Point-in-time capture of one instrument's book.
///
/// `bids` runs from the highest price down, `asks` from the lowest price up;
/// each holds at most the configured depth and only levels that exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Nanoseconds since midnight of the event that triggered the snapshot
    pub timestamp: u64,

    pub instrument: InstrumentId,

    /// Number of events applied to this book when the snapshot was taken
    pub sequence: u64,

    /// Event that triggered the snapshot
    pub trigger: EventKind,

    /// Side touched by the triggering event
    pub trigger_side: Side,

    pub bids: Vec<BookLevel>,

    pub asks: Vec<BookLevel>,
}

impl Snapshot {
    /// Best (highest) bid level.
    #[inline]
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.first().copied()
    }

    /// Best (lowest) ask level.
    #[inline]
    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.first().copied()
    }

    /// Best level on one side.
    pub fn best(&self, side: Side) -> Option<BookLevel> {
        match side {
            Side::Bid => self.best_bid(),
            Side::Ask => self.best_ask(),
            Side::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: Price, size: u64) -> BookLevel {
        BookLevel {
            price,
            size,
            orders: 1,
        }
    }

    fn snapshot(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Snapshot {
        Snapshot {
            timestamp: 0,
            instrument: 1,
            sequence: 0,
            trigger: EventKind::Add,
            trigger_side: Side::Bid,
            bids,
            asks,
        }
    }

    #[test]
    fn test_side_from_byte() {
        assert_eq!(Side::from_byte(b'B'), Some(Side::Bid));
        assert_eq!(Side::from_byte(b'S'), Some(Side::Ask));
        assert_eq!(Side::from_byte(b'A'), None);
        assert_eq!(Side::from_byte(b' '), None);
    }

    #[test]
    fn test_side_to_byte() {
        assert_eq!(Side::Bid.to_byte(), b'B');
        assert_eq!(Side::Ask.to_byte(), b'S');
        assert!(Side::Bid.is_bid());
        assert!(Side::Ask.is_ask());
        assert!(!Side::None.is_bid());
    }

    #[test]
    fn test_book_consistency() {
        assert_eq!(
            BookConsistency::classify(Some(100), Some(101)),
            BookConsistency::Valid
        );
        assert_eq!(
            BookConsistency::classify(Some(100), Some(100)),
            BookConsistency::Locked
        );
        assert_eq!(
            BookConsistency::classify(Some(101), Some(100)),
            BookConsistency::Crossed
        );
        assert_eq!(
            BookConsistency::classify(None, Some(100)),
            BookConsistency::Empty
        );
    }

    #[test]
    fn test_snapshot_best_per_side() {
        let snap = snapshot(vec![level(1_000_000, 100)], vec![level(1_000_100, 200)]);
        assert_eq!(snap.best(Side::Bid), Some(level(1_000_000, 100)));
        assert_eq!(snap.best(Side::Ask).unwrap().size, 200);
        assert_eq!(snap.best(Side::None), None);
    }

    #[test]
    fn test_snapshot_empty_side() {
        let snap = snapshot(vec![level(1_000_000, 100)], vec![]);
        assert_eq!(snap.best_ask(), None);
        assert_eq!(snap.best(Side::Ask), None);
    }
}
