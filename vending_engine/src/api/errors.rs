use thiserror::Error;
use vmc_common::Money;

use crate::{
    db_types::{MakeStatus, OrderNo, PaymentStatus},
    traits::StoreError,
};

#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("The requested machine (id {0}) does not exist")]
    MachineNotFound(i64),
    #[error("Owner {actor} does not control machine {machine_id}")]
    PermissionDenied { machine_id: i64, actor: i64 },
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("The requested member (id {0}) does not exist")]
    MemberNotFound(i64),
    #[error("The requested machine (id {0}) does not exist")]
    MachineNotFound(i64),
    #[error("The requested product (id {0}) does not exist")]
    ProductNotFound(i64),
    #[error("Machine {0} is not open for business")]
    MachineNotAvailable(i64),
    #[error("The controller for device {0} is offline or unreachable")]
    DeviceOffline(String),
    #[error("Product {product_id} is not on sale on machine {machine_id}")]
    ProductNotOnSale { machine_id: i64, product_id: i64 },
    #[error("Silo {0} has no stock left")]
    StockEmpty(i64),
    #[error("Invalid payment amount {pay_amount} for an order totalling {total_amount}")]
    InvalidPaymentAmount { pay_amount: Money, total_amount: Money },
    #[error("The requested order (internal id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNoNotFound(OrderNo),
    #[error("Order {order_no} cannot be refunded while its payment status is {status}")]
    InvalidOrderStatus { order_no: OrderNo, status: PaymentStatus },
    #[error("Order {0} has already been refunded")]
    OrderAlreadyRefunded(OrderNo),
    #[error("Order {0} has not been paid")]
    OrderNotPaid(OrderNo),
    #[error("Illegal fulfillment transition for order {order_no}: {from} -> {to}")]
    IllegalMakeTransition { order_no: OrderNo, from: MakeStatus, to: MakeStatus },
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

/// The only hard failure a payment callback can produce. Everything else is acknowledged.
#[derive(Debug, Clone, Error)]
pub enum CallbackError {
    #[error("Payment callback rejected: missing signature")]
    MissingSignature,
}

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("The requested silo (id {0}) does not exist")]
    SiloNotFound(i64),
    #[error("The requested product (id {0}) does not exist")]
    ProductNotFound(i64),
    #[error("Invalid stock level {0}: stock cannot be negative")]
    InvalidStock(i64),
    #[error("Stock level {requested} exceeds the silo capacity of {max_capacity}")]
    StockExceedsCapacity { requested: i64, max_capacity: i64 },
    #[error("Silo {0} cannot go on sale without an assigned product")]
    ProductNotAssigned(i64),
    #[error("Silo {0} cannot go on sale with no stock")]
    StockEmpty(i64),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum FleetError {
    #[error("The requested machine (id {0}) does not exist")]
    MachineNotFound(i64),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}
