use crate::{
    db_types::{Order, OrderNo},
    order_objects::OrderQueryFilter,
    traits::StoreError,
};

/// Read-side order queries. Soft-marked orders are excluded from every result.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, StoreError>;

    /// Returns the order carrying the given external order number, if any.
    async fn fetch_order_by_order_no(&self, order_no: &OrderNo) -> Result<Option<Order>, StoreError>;

    /// All orders placed by the given member, oldest first.
    async fn fetch_orders_for_member(&self, member_id: i64) -> Result<Vec<Order>, StoreError>;

    /// Fetches orders according to the criteria in the [`OrderQueryFilter`], oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError>;
}
