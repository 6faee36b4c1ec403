use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{MakeStatus, NewOrder, Order, OrderNo},
    traits::{CatalogManagement, FleetManagement, OrderManagement},
};

/// The write-side contract of the engine's storage backends.
///
/// Every mutation here is conditional: payment and fulfillment transitions are guarded on the
/// status read by the caller, and the record's version counter is incremented on every write.
/// A mutation whose guard no longer holds returns `Ok(None)` rather than applying anything, so
/// that concurrent duplicates degrade to no-ops instead of double-applying.
#[allow(async_fn_in_trait)]
pub trait VendingDatabase: Clone + OrderManagement + FleetManagement + CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Persists a brand-new order in `{WaitPay, WaitMake}` state.
    ///
    /// Order numbers are engine-generated and never reused; a unique-constraint violation maps to
    /// [`StoreError::OrderAlreadyExists`].
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Transitions the order to `Paid`, recording the provider reference and payment time.
    ///
    /// The write only happens if the order is still `WaitPay`; this is the compare-and-swap that
    /// makes duplicate payment callbacks safe. Returns `None` when the guard failed (the order is
    /// missing or no longer `WaitPay`).
    async fn mark_order_paid(
        &self,
        order_no: &OrderNo,
        channel_order_no: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError>;

    /// Transitions a `WaitPay` order to `Invalid` (failed/cancelled/timed-out payment attempt).
    /// Same guard semantics as [`Self::mark_order_paid`].
    async fn mark_order_invalid(&self, order_no: &OrderNo) -> Result<Option<Order>, StoreError>;

    /// Transitions a `Paid` order to `Refunded`, stamping the refund time, copying `pay_amount`
    /// into `refund_amount` and recording the reason. Guarded on `Paid`, so at most one refund
    /// can ever be applied to an order.
    async fn refund_order(
        &self,
        id: i64,
        reason: &str,
        refund_time: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError>;

    /// Advances `make_status` from `from` to `to` in a single guarded write. When `to` is
    /// `Making` the write additionally requires `payment_status = 'Paid'` — dispense is gated
    /// entirely on settled payment.
    async fn set_make_status(
        &self,
        order_no: &OrderNo,
        from: MakeStatus,
        to: MakeStatus,
    ) -> Result<Option<Order>, StoreError>;

    /// Soft-marks an order. Orders are never deleted; marked orders vanish from queries.
    async fn mark_order_deleted(&self, order_no: &OrderNo) -> Result<Option<Order>, StoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with order number {0}")]
    OrderAlreadyExists(OrderNo),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNo),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The requested machine (id {0}) does not exist")]
    MachineNotFound(i64),
    #[error("The requested silo (id {0}) does not exist")]
    SiloNotFound(i64),
    #[error("The requested product (id {0}) does not exist")]
    ProductNotFound(i64),
    #[error("The requested member (id {0}) does not exist")]
    MemberNotFound(i64),
    #[error("Silo number {silo_number} is already taken on machine {machine_id}")]
    SiloNumberTaken { machine_id: i64, silo_number: i64 },
    #[error("Device code {0} is already registered to another machine")]
    DeviceCodeTaken(String),
    #[error("The {entity} record (id {id}) changed since it was read. Re-read and retry.")]
    ConcurrentUpdate { entity: &'static str, id: i64 },
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
