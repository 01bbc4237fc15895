//! Price level: FIFO queue of orders with cached aggregate size.
//!
//! # Invariant
//!
//! `total_size` always equals the sum of the queued order sizes. All mutation
//! goes through the methods below; debug builds re-check the sum after each one
//! via `verify_invariant()`.
//!
//! # Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `push` | O(1) amortized |
//! | `reduce` (order stays) | O(1) |
//! | `remove` | O(n) (order-preserving shift) |
//! | `total_size` | O(1) |
//! | `front` | O(1) |

use indexmap::IndexMap;

use crate::types::{BookLevel, Price};

/// All resting orders at one price on one side, in arrival order.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    /// order_id → remaining size, in arrival order
    queue: IndexMap<u64, u32>,
    /// Cached sum of `queue` sizes
    total_size: u64,
}

impl PriceLevel {
    #[inline]
    pub fn new(price: Price) -> Self {
        Self {
            price,
            queue: IndexMap::new(),
            total_size: 0,
        }
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Append an order at the back of the queue.
    ///
    /// Returns `false` (and changes nothing) if the id is already queued.
    pub fn push(&mut self, order_id: u64, size: u32) -> bool {
        if self.queue.contains_key(&order_id) {
            return false;
        }
        self.queue.insert(order_id, size);
        self.total_size += size as u64;

        #[cfg(debug_assertions)]
        self.verify_invariant();

        true
    }

    /// Reduce an order by `delta` shares (clamped to its size).
    ///
    /// Returns the remaining size; an order reaching zero leaves the queue.
    pub fn reduce(&mut self, order_id: u64, delta: u32) -> Option<u32> {
        let size = self.queue.get_mut(&order_id)?;
        let actual = delta.min(*size);
        *size -= actual;
        let remaining = *size;
        self.total_size -= actual as u64;

        if remaining == 0 {
            self.queue.shift_remove(&order_id);
        }

        #[cfg(debug_assertions)]
        self.verify_invariant();

        Some(remaining)
    }

    /// Remove an order regardless of its remaining size. Returns that size.
    pub fn remove(&mut self, order_id: u64) -> Option<u32> {
        let size = self.queue.shift_remove(&order_id)?;
        self.total_size -= size as u64;

        #[cfg(debug_assertions)]
        self.verify_invariant();

        Some(size)
    }

    /// Cached aggregate size (O(1)).
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn get(&self, order_id: u64) -> Option<u32> {
        self.queue.get(&order_id).copied()
    }

    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.queue.contains_key(&order_id)
    }

    /// Order with the highest time priority.
    #[inline]
    pub fn front(&self) -> Option<(u64, u32)> {
        self.queue.first().map(|(id, size)| (*id, *size))
    }

    /// Orders in time priority.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.queue.iter().map(|(id, size)| (*id, *size))
    }

    /// Aggregated view of this level.
    #[inline]
    pub fn to_book_level(&self) -> BookLevel {
        BookLevel {
            price: self.price,
            size: self.total_size,
            orders: self.queue.len(),
        }
    }

    /// Sum the queue (O(n)); compare against `total_size`.
    pub fn compute_actual_total(&self) -> u64 {
        self.queue.values().map(|&size| size as u64).sum()
    }

    /// Check the cached aggregate and that no zero-size order is queued.
    pub fn is_consistent(&self) -> bool {
        self.compute_actual_total() == self.total_size && self.queue.values().all(|&s| s > 0)
    }

    #[cfg(debug_assertions)]
    #[inline]
    pub fn verify_invariant(&self) {
        debug_assert_eq!(
            self.compute_actual_total(),
            self.total_size,
            "PriceLevel invariant violated at price {}",
            self.price
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub fn verify_invariant(&self) {}
}
