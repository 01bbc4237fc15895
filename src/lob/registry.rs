//! Order identifier → resting order index.
//!
//! Execute, cancel and delete messages carry only the order reference number,
//! so every such event resolves price and side through this table first.
//! Identifiers that leave the book are retired and can never be inserted again.

use ahash::{AHashMap, AHashSet};

use crate::error::IntegrityError;
use crate::types::Order;

/// Hash index of active orders plus the set of retired identifiers.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    orders: AHashMap<u64, Order>,
    retired: AHashSet<u64>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `order_id` may be inserted, without inserting it.
    #[inline]
    pub fn check_insertable(&self, order_id: u64) -> Result<(), IntegrityError> {
        if self.orders.contains_key(&order_id) {
            Err(IntegrityError::DuplicateOrderId(order_id))
        } else if self.retired.contains(&order_id) {
            Err(IntegrityError::RetiredOrderId(order_id))
        } else {
            Ok(())
        }
    }

    /// Insert a new active order.
    pub fn insert(&mut self, order_id: u64, order: Order) -> Result<(), IntegrityError> {
        self.check_insertable(order_id)?;
        self.orders.insert(order_id, order);
        Ok(())
    }

    /// Look up an active order.
    #[inline]
    pub fn get(&self, order_id: u64) -> Result<&Order, IntegrityError> {
        self.orders
            .get(&order_id)
            .ok_or(IntegrityError::UnknownOrderId(order_id))
    }

    /// Set an active order's remaining size. Returns the previous size.
    pub fn update_size(&mut self, order_id: u64, size: u32) -> Result<u32, IntegrityError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(IntegrityError::UnknownOrderId(order_id))?;
        Ok(std::mem::replace(&mut order.size, size))
    }

    /// Remove an active order and retire its identifier.
    pub fn remove(&mut self, order_id: u64) -> Result<Order, IntegrityError> {
        let order = self
            .orders
            .remove(&order_id)
            .ok_or(IntegrityError::UnknownOrderId(order_id))?;
        self.retired.insert(order_id);
        Ok(order)
    }

    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    #[inline]
    pub fn is_retired(&self, order_id: u64) -> bool {
        self.retired.contains(&order_id)
    }

    /// Number of active orders.
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Active orders in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Order)> {
        self.orders.iter().map(|(id, order)| (*id, order))
    }
}
