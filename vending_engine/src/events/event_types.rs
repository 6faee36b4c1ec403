use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// Emitted when a new order has been persisted in `{WaitPay, WaitMake}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted exactly once per order, when a payment callback wins the WaitPay guard.
/// Downstream dispense logic subscribes to this to start making the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when a machine owner refunds a paid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRefundedEvent {
    pub order: Order,
}

impl OrderRefundedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
