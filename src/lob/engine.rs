//! Per-instrument order book engine.
//!
//! Owns one [`OrderRegistry`] and two [`PriceLevelLadder`]s and applies decoded
//! events to them. Every operation validates against the current state before
//! touching anything, so a rejected event leaves the book exactly as it was.
//!
//! | Event | Registry | Ladder | Trade |
//! |-------|----------|--------|-------|
//! | add | insert | add_order | - |
//! | execute | update_size / remove | reduce_order | yes |
//! | cancel | update_size / remove | reduce_order | - |
//! | delete | remove | remove_order | - |
//! | replace | remove + insert | remove_order + add_order | - |
//! | hidden / cross trade | - | - | yes |

use super::ladder::PriceLevelLadder;
use super::registry::OrderRegistry;
use crate::error::IntegrityError;
use crate::itch::{ExecutionPrice, ItchEvent, TradeMessage};
use crate::types::{
    BookConsistency, EventKind, InstrumentId, Order, Price, Side, Snapshot, Trade, TradeKind,
};

/// Counters for one instrument's book.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Events that changed the book or produced a trade
    pub events_applied: u64,
    pub adds: u64,
    pub executions: u64,
    pub cancels: u64,
    pub deletes: u64,
    pub replaces: u64,
    pub hidden_trades: u64,
    pub cross_trades: u64,

    /// Events refused by [`OrderBookEngine::apply`]
    pub rejected: u64,

    /// Shares executed against displayed orders
    pub executed_volume: u64,

    /// Events after which best bid > best ask
    pub crossed_books: u64,

    /// Events after which best bid == best ask
    pub locked_books: u64,

    /// Timestamp of the last applied event (nanoseconds since midnight)
    pub last_timestamp: Option<u64>,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub kind: EventKind,
    /// Book side the event touched (`Side::None` for crosses and admin messages)
    pub side: Side,
    pub trade: Option<Trade>,
}

impl Applied {
    fn book(kind: EventKind, side: Side) -> Self {
        Self {
            kind,
            side,
            trade: None,
        }
    }
}

/// Order book for one instrument.
///
/// # Example
///
/// ```
/// use itch_lob_reconstructor::lob::OrderBookEngine;
/// use itch_lob_reconstructor::types::Side;
///
/// let mut book = OrderBookEngine::new(1);
/// book.add_order(1, Side::Bid, 1_000_000, 10, 0).unwrap();
/// book.add_order(2, Side::Bid, 1_000_000, 5, 1).unwrap();
/// let trade = book.execute_order(1, 10, None, 42, 2).unwrap();
///
/// assert_eq!(trade.price, 1_000_000);
/// assert_eq!(book.bids().best_level().unwrap().size, 5);
/// ```
#[derive(Debug, Clone)]
pub struct OrderBookEngine {
    instrument: InstrumentId,
    symbol: Option<String>,
    registry: OrderRegistry,
    bids: PriceLevelLadder,
    asks: PriceLevelLadder,
    /// Arrival counter for resting orders
    next_order_sequence: u64,
    /// Per-instrument trade counter
    trade_sequence: u64,
    stats: EngineStats,
}

impl OrderBookEngine {
    pub fn new(instrument: InstrumentId) -> Self {
        Self {
            instrument,
            symbol: None,
            registry: OrderRegistry::new(),
            bids: PriceLevelLadder::new(Side::Bid),
            asks: PriceLevelLadder::new(Side::Ask),
            next_order_sequence: 0,
            trade_sequence: 0,
            stats: EngineStats::default(),
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[inline]
    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn set_symbol(&mut self, symbol: impl Into<String>) {
        self.symbol = Some(symbol.into());
    }

    /// Apply a decoded event.
    ///
    /// On error nothing was mutated; only the `rejected` counter moves.
    pub fn apply(&mut self, event: &ItchEvent) -> Result<Applied, IntegrityError> {
        let ts = event.timestamp();
        let result = match event {
            ItchEvent::AddOrder(m) => self
                .add_order(m.order_ref, m.side, m.price, m.shares, ts)
                .map(|_| Applied::book(EventKind::Add, m.side)),
            ItchEvent::ExecuteOrder(m) => self
                .execute_order(
                    m.order_ref,
                    m.executed_shares,
                    m.with_price,
                    m.match_number,
                    ts,
                )
                .map(|trade| Applied {
                    kind: EventKind::Execute,
                    side: trade.passive_side,
                    trade: Some(trade),
                }),
            ItchEvent::CancelOrder(m) => self
                .cancel_order(m.order_ref, m.cancelled_shares, ts)
                .map(|side| Applied::book(EventKind::Cancel, side)),
            ItchEvent::DeleteOrder(m) => self
                .delete_order(m.order_ref, ts)
                .map(|order| Applied::book(EventKind::Delete, order.side)),
            ItchEvent::ReplaceOrder(m) => self
                .replace_order(m.original_order_ref, m.new_order_ref, m.price, m.shares, ts)
                .map(|side| Applied::book(EventKind::Replace, side)),
            ItchEvent::Trade(m) => {
                let trade = self.record_trade(m);
                Ok(Applied {
                    kind: EventKind::Trade,
                    side: trade.passive_side,
                    trade: Some(trade),
                })
            }
            ItchEvent::Administrative(_) => {
                return Ok(Applied::book(EventKind::Administrative, Side::None))
            }
        };

        if result.is_err() {
            self.stats.rejected += 1;
        }
        result
    }

    /// Rest a new order at the back of its price level.
    pub fn add_order(
        &mut self,
        order_id: u64,
        side: Side,
        price: Price,
        size: u32,
        timestamp: u64,
    ) -> Result<(), IntegrityError> {
        if side == Side::None {
            return Err(IntegrityError::MissingSide(order_id));
        }
        if size == 0 {
            return Err(IntegrityError::ZeroQuantity(order_id));
        }
        self.registry.check_insertable(order_id)?;
        self.insert_resting(order_id, side, price, size, timestamp)?;
        self.stats.adds += 1;
        self.after_event(timestamp);
        Ok(())
    }

    /// Execute part or all of a resting order and emit the trade.
    ///
    /// The trade price is the order's resting price unless the message carries
    /// its own (execution with price).
    pub fn execute_order(
        &mut self,
        order_id: u64,
        size: u32,
        with_price: Option<ExecutionPrice>,
        match_number: u64,
        timestamp: u64,
    ) -> Result<Trade, IntegrityError> {
        let order = self.reduce_resting(order_id, size)?;
        self.stats.executions += 1;
        self.stats.executed_volume += size as u64;

        self.after_event(timestamp);

        let (price, printable, kind) = match with_price {
            Some(p) => (p.price, p.printable, TradeKind::ExecutionWithPrice),
            None => (order.price, true, TradeKind::Execution),
        };
        Ok(Trade {
            timestamp,
            instrument: self.instrument,
            price,
            size: size as u64,
            passive_side: order.side,
            sequence: self.next_trade_sequence(),
            event_sequence: self.stats.events_applied,
            match_number,
            kind,
            order_id: Some(order_id),
            printable,
        })
    }

    /// Cancel part of a resting order. Returns the order's side.
    pub fn cancel_order(
        &mut self,
        order_id: u64,
        size: u32,
        timestamp: u64,
    ) -> Result<Side, IntegrityError> {
        let order = self.reduce_resting(order_id, size)?;
        self.stats.cancels += 1;
        self.after_event(timestamp);
        Ok(order.side)
    }

    /// Remove a resting order regardless of its remaining size.
    pub fn delete_order(&mut self, order_id: u64, timestamp: u64) -> Result<Order, IntegrityError> {
        let order = *self.registry.get(order_id)?;
        self.ladder_mut(order.side)
            .remove_order(order.price, order_id)
            .ok_or(IntegrityError::UnknownOrderId(order_id))?;
        let order = self.registry.remove(order_id)?;
        self.stats.deletes += 1;
        self.after_event(timestamp);
        Ok(order)
    }

    /// Atomically move an order onto a new identifier, price and size.
    ///
    /// The new order keeps the old side and goes to the back of its level.
    /// Both halves are validated before either is applied.
    pub fn replace_order(
        &mut self,
        old_id: u64,
        new_id: u64,
        price: Price,
        size: u32,
        timestamp: u64,
    ) -> Result<Side, IntegrityError> {
        let old = *self.registry.get(old_id)?;
        self.registry.check_insertable(new_id)?;
        if size == 0 {
            return Err(IntegrityError::ZeroQuantity(new_id));
        }

        self.ladder_mut(old.side)
            .remove_order(old.price, old_id)
            .ok_or(IntegrityError::UnknownOrderId(old_id))?;
        self.registry.remove(old_id)?;
        self.insert_resting(new_id, old.side, price, size, timestamp)?;
        self.stats.replaces += 1;
        self.after_event(timestamp);
        Ok(old.side)
    }

    /// Record a trade against liquidity outside the visible book.
    pub fn record_trade(&mut self, message: &TradeMessage) -> Trade {
        let sequence = self.next_trade_sequence();
        self.after_event(message.header().timestamp);
        let event_sequence = self.stats.events_applied;
        match message {
            TradeMessage::NonCross(t) => {
                self.stats.hidden_trades += 1;
                Trade {
                    timestamp: t.header.timestamp,
                    instrument: self.instrument,
                    price: t.price,
                    size: t.shares as u64,
                    passive_side: t.side,
                    sequence,
                    event_sequence,
                    match_number: t.match_number,
                    kind: TradeKind::Hidden,
                    order_id: (t.order_ref != 0).then_some(t.order_ref),
                    printable: true,
                }
            }
            TradeMessage::Cross(t) => {
                self.stats.cross_trades += 1;
                Trade {
                    timestamp: t.header.timestamp,
                    instrument: self.instrument,
                    price: t.cross_price,
                    size: t.shares,
                    passive_side: Side::None,
                    sequence,
                    event_sequence,
                    match_number: t.match_number,
                    kind: TradeKind::Cross,
                    order_id: None,
                    printable: true,
                }
            }
        }
    }

    /// Capture up to `depth` levels per side.
    pub fn snapshot(&self, depth: usize, trigger: EventKind, trigger_side: Side) -> Snapshot {
        Snapshot {
            timestamp: self.stats.last_timestamp.unwrap_or(0),
            instrument: self.instrument,
            sequence: self.stats.events_applied,
            trigger,
            trigger_side,
            bids: self.bids.depth(depth),
            asks: self.asks.depth(depth),
        }
    }

    fn insert_resting(
        &mut self,
        order_id: u64,
        side: Side,
        price: Price,
        size: u32,
        timestamp: u64,
    ) -> Result<(), IntegrityError> {
        let order = Order {
            instrument: self.instrument,
            side,
            price,
            size,
            sequence: self.next_order_sequence,
            timestamp,
        };
        self.registry.insert(order_id, order)?;
        if !self.ladder_mut(side).add_order(price, order_id, size) {
            // Unreachable while registry and ladders agree; undo the insert.
            self.registry.remove(order_id)?;
            return Err(IntegrityError::DuplicateOrderId(order_id));
        }
        self.next_order_sequence += 1;
        Ok(())
    }

    /// Shared execute/cancel path. Returns the order as it was before.
    fn reduce_resting(&mut self, order_id: u64, size: u32) -> Result<Order, IntegrityError> {
        let order = *self.registry.get(order_id)?;
        if size == 0 {
            return Err(IntegrityError::ZeroQuantity(order_id));
        }
        if size > order.size {
            return Err(IntegrityError::OverReduction {
                order_id,
                requested: size,
                remaining: order.size,
            });
        }

        let remaining = self
            .ladder_mut(order.side)
            .reduce_order(order.price, order_id, size)
            .ok_or(IntegrityError::UnknownOrderId(order_id))?;
        if remaining == 0 {
            self.registry.remove(order_id)?;
        } else {
            self.registry.update_size(order_id, remaining)?;
        }
        Ok(order)
    }

    fn after_event(&mut self, timestamp: u64) {
        self.stats.events_applied += 1;
        self.stats.last_timestamp = Some(timestamp);

        match self.consistency() {
            BookConsistency::Crossed => {
                self.stats.crossed_books += 1;
                log::debug!(
                    "instrument {}: crossed book bid={:?} ask={:?} (event #{})",
                    self.instrument,
                    self.bids.best(),
                    self.asks.best(),
                    self.stats.events_applied
                );
            }
            BookConsistency::Locked => self.stats.locked_books += 1,
            BookConsistency::Valid | BookConsistency::Empty => {}
        }
    }

    #[inline]
    fn next_trade_sequence(&mut self) -> u64 {
        self.trade_sequence += 1;
        self.trade_sequence
    }

    #[inline]
    fn ladder_mut(&mut self, side: Side) -> &mut PriceLevelLadder {
        if side.is_bid() {
            &mut self.bids
        } else {
            &mut self.asks
        }
    }

    /// Ladder for a book side. `Side::None` never rests; it maps to asks here.
    #[inline]
    pub fn ladder(&self, side: Side) -> &PriceLevelLadder {
        if side.is_bid() {
            &self.bids
        } else {
            &self.asks
        }
    }

    #[inline]
    pub fn bids(&self) -> &PriceLevelLadder {
        &self.bids
    }

    #[inline]
    pub fn asks(&self) -> &PriceLevelLadder {
        &self.asks
    }

    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best()
    }

    #[inline]
    pub fn consistency(&self) -> BookConsistency {
        BookConsistency::classify(self.bids.best(), self.asks.best())
    }

    #[inline]
    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    pub fn order(&self, order_id: u64) -> Option<&Order> {
        self.registry.get(order_id).ok()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Cross-check registry and ladders.
    ///
    /// Every registered order must sit exactly once in the ladder of its side,
    /// at its registered price and size, and each ladder must agree with its
    /// own cached aggregates.
    pub fn check_invariants(&self) -> Result<(), String> {
        if !self.bids.is_consistent() {
            return Err("bid ladder cache disagrees with its levels".to_string());
        }
        if !self.asks.is_consistent() {
            return Err("ask ladder cache disagrees with its levels".to_string());
        }
        let queued = self.bids.order_count() + self.asks.order_count();
        if queued != self.registry.len() {
            return Err(format!(
                "{} orders registered but {} queued",
                self.registry.len(),
                queued
            ));
        }
        for (id, order) in self.registry.iter() {
            let queued_size = self
                .ladder(order.side)
                .level(order.price)
                .and_then(|level| level.get(id));
            if queued_size != Some(order.size) {
                return Err(format!(
                    "order {id} registered as {}@{} but queued as {:?}",
                    order.size, order.price, queued_size
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itch::fields::pad_alpha;
    use crate::itch::{CrossTrade, MessageHeader, NonCrossTrade, OrderDelete};

    const P100: Price = 1_000_000;
    const P101: Price = 1_010_000;

    fn book() -> OrderBookEngine {
        OrderBookEngine::new(1)
    }

    #[test]
    fn test_execute_removes_filled_order_and_emits_trade() {
        let mut book = book();
        book.add_order(1, Side::Bid, P100, 10, 1).unwrap();
        book.add_order(2, Side::Bid, P100, 5, 2).unwrap();

        let trade = book.execute_order(1, 10, None, 500, 3).unwrap();
        assert_eq!(trade.price, P100);
        assert_eq!(trade.size, 10);
        assert_eq!(trade.passive_side, Side::Bid);
        assert_eq!(trade.sequence, 1);
        assert_eq!(trade.kind, TradeKind::Execution);
        assert_eq!(trade.event_sequence, 3);
        assert_eq!(
            book.snapshot(1, EventKind::Execute, Side::Bid).sequence,
            trade.event_sequence
        );

        let level = book.bids().level(P100).unwrap();
        assert_eq!(level.total_size(), 5);
        assert_eq!(level.iter().collect::<Vec<_>>(), vec![(2, 5)]);
        assert!(book.order(1).is_none());
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_execute_with_price_overrides_resting_price() {
        let mut book = book();
        book.add_order(1, Side::Ask, P101, 100, 1).unwrap();
        let trade = book
            .execute_order(
                1,
                40,
                Some(ExecutionPrice {
                    printable: false,
                    price: P100,
                }),
                9,
                2,
            )
            .unwrap();
        assert_eq!(trade.price, P100);
        assert!(!trade.printable);
        assert_eq!(trade.kind, TradeKind::ExecutionWithPrice);
        assert_eq!(book.order(1).unwrap().size, 60);
        assert_eq!(book.asks().best_level().unwrap().size, 60);
    }

    #[test]
    fn test_replace_moves_order_to_new_level() {
        let mut book = book();
        book.add_order(1, Side::Bid, P100, 10, 1).unwrap();
        let side = book.replace_order(1, 2, P101, 20, 2).unwrap();
        assert_eq!(side, Side::Bid);
        assert!(book.bids().level(P100).is_none());
        let level = book.bids().level(P101).unwrap();
        assert_eq!(level.total_size(), 20);
        assert_eq!(level.front(), Some((2, 20)));
        assert_eq!(book.best_bid(), Some(P101));
        assert!(book.registry().is_retired(1));
    }

    #[test]
    fn test_replace_loses_time_priority() {
        let mut book = book();
        book.add_order(1, Side::Ask, P100, 10, 1).unwrap();
        book.add_order(2, Side::Ask, P100, 10, 2).unwrap();
        book.replace_order(1, 3, P100, 10, 3).unwrap();
        let ids: Vec<u64> = book
            .asks()
            .level(P100)
            .unwrap()
            .iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_rejected_replace_leaves_book_untouched() {
        let mut book = book();
        book.add_order(1, Side::Bid, P100, 10, 1).unwrap();
        book.add_order(2, Side::Bid, P101, 10, 2).unwrap();

        assert_eq!(
            book.replace_order(1, 2, P101, 5, 3),
            Err(IntegrityError::DuplicateOrderId(2))
        );
        assert_eq!(
            book.replace_order(1, 3, P101, 0, 3),
            Err(IntegrityError::ZeroQuantity(3))
        );
        assert_eq!(
            book.replace_order(9, 3, P101, 5, 3),
            Err(IntegrityError::UnknownOrderId(9))
        );
        assert_eq!(book.order(1).unwrap().size, 10);
        assert_eq!(book.bids().len(), 2);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_over_reduction_is_rejected() {
        let mut book = book();
        book.add_order(1, Side::Ask, P100, 10, 1).unwrap();
        assert_eq!(
            book.cancel_order(1, 11, 2),
            Err(IntegrityError::OverReduction {
                order_id: 1,
                requested: 11,
                remaining: 10
            })
        );
        assert!(book.execute_order(1, 11, None, 1, 2).is_err());
        assert_eq!(book.asks().best_level().unwrap().size, 10);
    }

    #[test]
    fn test_cancel_to_zero_removes_order() {
        let mut book = book();
        book.add_order(1, Side::Ask, P100, 10, 1).unwrap();
        book.cancel_order(1, 4, 2).unwrap();
        assert_eq!(book.order(1).unwrap().size, 6);
        book.cancel_order(1, 6, 3).unwrap();
        assert!(book.asks().is_empty());
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_zero_quantity_add_rejected() {
        let mut book = book();
        assert_eq!(
            book.add_order(1, Side::Bid, P100, 0, 1),
            Err(IntegrityError::ZeroQuantity(1))
        );
        assert!(!book.registry().is_retired(1));
    }

    #[test]
    fn test_sideless_add_rejected() {
        let mut book = book();
        assert_eq!(
            book.add_order(1, Side::None, P100, 10, 1),
            Err(IntegrityError::MissingSide(1))
        );
        assert!(book.asks().is_empty());
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.stats().events_applied, 0);

        // The id stays usable for a proper add
        book.add_order(1, Side::Ask, P100, 10, 2).unwrap();
        assert_eq!(book.best_ask(), Some(P100));
    }

    #[test]
    fn test_deleted_id_cannot_return() {
        let mut book = book();
        book.add_order(1, Side::Bid, P100, 10, 1).unwrap();
        book.delete_order(1, 2).unwrap();
        assert_eq!(
            book.add_order(1, Side::Bid, P100, 10, 3),
            Err(IntegrityError::RetiredOrderId(1))
        );
    }

    #[test]
    fn test_apply_counts_rejections_without_mutation() {
        let mut book = book();
        let delete = ItchEvent::DeleteOrder(OrderDelete {
            header: MessageHeader::new(1, 0, 10),
            order_ref: 77,
        });
        assert_eq!(
            book.apply(&delete),
            Err(IntegrityError::UnknownOrderId(77))
        );
        assert_eq!(book.stats().rejected, 1);
        assert_eq!(book.stats().events_applied, 0);
        assert_eq!(book.stats().last_timestamp, None);
    }

    #[test]
    fn test_hidden_and_cross_trades_do_not_touch_book() {
        let mut book = book();
        book.add_order(1, Side::Bid, P100, 10, 1).unwrap();

        let hidden = ItchEvent::Trade(TradeMessage::NonCross(NonCrossTrade {
            header: MessageHeader::new(1, 0, 5),
            order_ref: 0,
            side: Side::Ask,
            shares: 300,
            stock: pad_alpha("AAPL"),
            price: P101,
            match_number: 11,
        }));
        let applied = book.apply(&hidden).unwrap();
        let trade = applied.trade.unwrap();
        assert_eq!(trade.kind, TradeKind::Hidden);
        assert_eq!(trade.order_id, None);
        assert_eq!(trade.passive_side, Side::Ask);

        let cross = ItchEvent::Trade(TradeMessage::Cross(CrossTrade {
            header: MessageHeader::new(1, 0, 6),
            shares: 5_000,
            stock: pad_alpha("AAPL"),
            cross_price: P100,
            match_number: 12,
            cross_type: b'C',
        }));
        let trade = book.apply(&cross).unwrap().trade.unwrap();
        assert_eq!(trade.passive_side, Side::None);
        assert_eq!(trade.sequence, 2);

        assert_eq!(book.order_count(), 1);
        assert_eq!(book.bids().total_size(), 10);
        assert_eq!(book.stats().hidden_trades, 1);
        assert_eq!(book.stats().cross_trades, 1);
    }

    #[test]
    fn test_crossed_and_locked_books_are_counted() {
        let mut book = book();
        book.add_order(1, Side::Ask, P100, 10, 1).unwrap();
        let add = |id, side, price| {
            ItchEvent::AddOrder(crate::itch::AddOrder {
                header: MessageHeader::new(1, 0, 2),
                order_ref: id,
                side,
                shares: 10,
                stock: pad_alpha("AAPL"),
                price,
                attribution: None,
            })
        };
        book.apply(&add(2, Side::Bid, P100)).unwrap();
        assert_eq!(book.consistency(), BookConsistency::Locked);
        book.apply(&add(3, Side::Bid, P101)).unwrap();
        assert_eq!(book.consistency(), BookConsistency::Crossed);
        assert_eq!(book.stats().locked_books, 1);
        assert_eq!(book.stats().crossed_books, 1);
    }

    #[test]
    fn test_snapshot_depth_and_order() {
        let mut book = book();
        for (i, price) in [P100, P101, 990_000, 980_000].into_iter().enumerate() {
            book.add_order(i as u64 + 1, Side::Bid, price, 10, i as u64)
                .unwrap();
        }
        book.add_order(10, Side::Ask, 1_020_000, 7, 9).unwrap();
        let snap = book.snapshot(3, EventKind::Add, Side::Ask);
        let prices: Vec<Price> = snap.bids.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![P101, P100, 990_000]);
        assert_eq!(snap.asks.len(), 1);
        assert_eq!(snap.best_ask().unwrap().size, 7);
    }
}
