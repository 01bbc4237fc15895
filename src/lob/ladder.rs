//! One side of a book: price → [`PriceLevel`], best price first.
//!
//! Levels live in a `BTreeMap` under a side-adjusted key (price for asks,
//! negated price for bids) so the first entry is always the best price for
//! either side. The best price is cached and refreshed whenever the level it
//! points at is created or emptied.

use std::collections::BTreeMap;

use super::price_level::PriceLevel;
use crate::types::{BookLevel, Price, Side};

/// Ordering key: ascending key order is best-first for the ladder's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct LadderKey(i64);

/// Ordered price levels for one side of one instrument.
#[derive(Debug, Clone)]
pub struct PriceLevelLadder {
    side: Side,
    levels: BTreeMap<LadderKey, PriceLevel>,
    /// Cached first key's price
    best: Option<Price>,
    /// Number of queued orders across levels
    order_count: usize,
}

impl PriceLevelLadder {
    /// Create an empty ladder. `side` must be `Bid` or `Ask`.
    pub fn new(side: Side) -> Self {
        debug_assert!(side != Side::None, "ladder needs a bid or ask side");
        Self {
            side,
            levels: BTreeMap::new(),
            best: None,
            order_count: 0,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    fn key(&self, price: Price) -> LadderKey {
        if self.side.is_bid() {
            LadderKey(-(price as i64))
        } else {
            LadderKey(price as i64)
        }
    }

    /// Whether `a` ranks ahead of `b` on this side.
    #[inline]
    fn better(&self, a: Price, b: Price) -> bool {
        if self.side.is_bid() {
            a > b
        } else {
            a < b
        }
    }

    /// Queue an order at the back of its price level, creating the level if needed.
    ///
    /// Returns `false` if the id is already queued at that price.
    pub fn add_order(&mut self, price: Price, order_id: u64, size: u32) -> bool {
        let key = self.key(price);
        let added = self
            .levels
            .entry(key)
            .or_insert_with(|| PriceLevel::new(price))
            .push(order_id, size);
        if !added {
            return false;
        }

        self.order_count += 1;
        match self.best {
            Some(best) if !self.better(price, best) => {}
            _ => self.best = Some(price),
        }
        true
    }

    /// Reduce an order by `delta` shares. An order reaching zero leaves the
    /// queue, and an emptied level is deleted.
    ///
    /// Returns the order's remaining size, or `None` if it is not at `price`.
    pub fn reduce_order(&mut self, price: Price, order_id: u64, delta: u32) -> Option<u32> {
        let key = self.key(price);
        let level = self.levels.get_mut(&key)?;
        let remaining = level.reduce(order_id, delta)?;
        if remaining == 0 {
            self.order_count -= 1;
        }
        self.drop_if_empty(key, price);
        Some(remaining)
    }

    /// Remove an order regardless of remaining size. Returns that size.
    pub fn remove_order(&mut self, price: Price, order_id: u64) -> Option<u32> {
        let key = self.key(price);
        let size = self.levels.get_mut(&key)?.remove(order_id)?;
        self.order_count -= 1;
        self.drop_if_empty(key, price);
        Some(size)
    }

    fn drop_if_empty(&mut self, key: LadderKey, price: Price) {
        if !self.levels.get(&key).is_some_and(PriceLevel::is_empty) {
            return;
        }
        self.levels.remove(&key);
        if self.best == Some(price) {
            self.best = self.levels.values().next().map(PriceLevel::price);
        }
    }

    /// Best price (O(1)).
    #[inline]
    pub fn best(&self) -> Option<Price> {
        self.best
    }

    /// Best level (aggregated).
    pub fn best_level(&self) -> Option<BookLevel> {
        let price = self.best?;
        self.level(price).map(PriceLevel::to_book_level)
    }

    /// Order with time priority at the best price.
    pub fn front(&self) -> Option<(u64, u32)> {
        self.levels.values().next().and_then(PriceLevel::front)
    }

    #[inline]
    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&self.key(price))
    }

    /// Levels best-first.
    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }

    /// Up to `n` aggregated levels, best-first.
    pub fn depth(&self, n: usize) -> Vec<BookLevel> {
        self.levels
            .values()
            .take(n)
            .map(PriceLevel::to_book_level)
            .collect()
    }

    /// Number of price levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of queued orders across all levels.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    /// Resting shares across all levels.
    pub fn total_size(&self) -> u64 {
        self.levels.values().map(PriceLevel::total_size).sum()
    }

    /// Check cached state against a full scan: best price, order count,
    /// per-level aggregates, and that no empty level survives.
    pub fn is_consistent(&self) -> bool {
        let scanned_best = self.levels.values().next().map(PriceLevel::price);
        let scanned_orders: usize = self.levels.values().map(PriceLevel::order_count).sum();
        scanned_best == self.best
            && scanned_orders == self.order_count
            && self
                .levels
                .iter()
                .all(|(key, level)| {
                    !level.is_empty() && level.is_consistent() && *key == self.key(level.price())
                })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bid_best_is_highest() {
        let mut bids = PriceLevelLadder::new(Side::Bid);
        bids.add_order(1_000_000, 1, 100);
        bids.add_order(1_010_000, 2, 100);
        bids.add_order(990_000, 3, 100);
        assert_eq!(bids.best(), Some(1_010_000));
        let prices: Vec<Price> = bids.iter().map(PriceLevel::price).collect();
        assert_eq!(prices, vec![1_010_000, 1_000_000, 990_000]);
    }

    #[test]
    fn test_ask_best_is_lowest() {
        let mut asks = PriceLevelLadder::new(Side::Ask);
        asks.add_order(1_010_000, 1, 100);
        asks.add_order(1_000_000, 2, 100);
        asks.add_order(1_020_000, 3, 100);
        assert_eq!(asks.best(), Some(1_000_000));
        let depth = asks.depth(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].price, 1_000_000);
        assert_eq!(depth[1].price, 1_010_000);
    }

    #[test]
    fn test_best_refreshes_when_best_level_empties() {
        let mut bids = PriceLevelLadder::new(Side::Bid);
        bids.add_order(1_000_000, 1, 100);
        bids.add_order(1_010_000, 2, 50);
        assert_eq!(bids.reduce_order(1_010_000, 2, 50), Some(0));
        assert_eq!(bids.best(), Some(1_000_000));
        assert!(bids.level(1_010_000).is_none());
        assert_eq!(bids.remove_order(1_000_000, 1), Some(100));
        assert_eq!(bids.best(), None);
        assert!(bids.is_empty());
        assert!(bids.is_consistent());
    }

    #[test]
    fn test_removing_non_best_level_keeps_best() {
        let mut asks = PriceLevelLadder::new(Side::Ask);
        asks.add_order(1_000_000, 1, 100);
        asks.add_order(1_010_000, 2, 100);
        asks.remove_order(1_010_000, 2);
        assert_eq!(asks.best(), Some(1_000_000));
        assert_eq!(asks.len(), 1);
    }

    #[test]
    fn test_partial_reduce_keeps_level() {
        let mut asks = PriceLevelLadder::new(Side::Ask);
        asks.add_order(1_000_000, 1, 100);
        asks.add_order(1_000_000, 2, 40);
        assert_eq!(asks.reduce_order(1_000_000, 1, 60), Some(40));
        let best = asks.best_level().unwrap();
        assert_eq!(best.size, 80);
        assert_eq!(best.orders, 2);
        assert_eq!(asks.order_count(), 2);
    }

    #[test]
    fn test_front_is_first_arrival_at_best() {
        let mut bids = PriceLevelLadder::new(Side::Bid);
        bids.add_order(1_000_000, 7, 10);
        bids.add_order(1_000_000, 3, 20);
        bids.add_order(990_000, 1, 30);
        assert_eq!(bids.front(), Some((7, 10)));
    }

    #[test]
    fn test_missing_order_is_none() {
        let mut bids = PriceLevelLadder::new(Side::Bid);
        bids.add_order(1_000_000, 1, 10);
        assert_eq!(bids.reduce_order(1_000_000, 2, 5), None);
        assert_eq!(bids.remove_order(990_000, 1), None);
        assert_eq!(bids.total_size(), 10);
    }

    #[test]
    fn test_duplicate_add_at_same_price() {
        let mut bids = PriceLevelLadder::new(Side::Bid);
        assert!(bids.add_order(1_000_000, 1, 10));
        assert!(!bids.add_order(1_000_000, 1, 10));
        assert_eq!(bids.order_count(), 1);
        assert_eq!(bids.total_size(), 10);
    }
}
