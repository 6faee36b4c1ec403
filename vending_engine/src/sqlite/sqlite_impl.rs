//! `SqliteDatabase` is the concrete SQLite implementation of the vending engine's storage
//! backend. It implements all the traits in the [`crate::traits`] module by delegating to the
//! plain query functions in [`super::db`].
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::db::{catalog, db_url, machines, new_pool, orders, silos};
use crate::{
    db_types::{
        BusinessStatus,
        Machine,
        MakeStatus,
        MaterialSilo,
        Member,
        NewOrder,
        Order,
        OrderNo,
        Product,
        SaleStatus,
    },
    order_objects::OrderQueryFilter,
    traits::{
        CatalogManagement,
        FleetManagement,
        NewMachine,
        NewMember,
        NewProduct,
        NewSilo,
        OrderManagement,
        StoreError,
        VendingDatabase,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects using the URL from the `VMC_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, StoreError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl VendingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn mark_order_paid(
        &self,
        order_no: &OrderNo,
        channel_order_no: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_paid(order_no, channel_order_no, paid_at, &mut conn).await
    }

    async fn mark_order_invalid(&self, order_no: &OrderNo) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_invalid(order_no, &mut conn).await
    }

    async fn refund_order(
        &self,
        id: i64,
        reason: &str,
        refund_time: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::refund(id, reason, refund_time, &mut conn).await
    }

    async fn set_make_status(
        &self,
        order_no: &OrderNo,
        from: MakeStatus,
        to: MakeStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_make_status(order_no, from, to, &mut conn).await
    }

    async fn mark_order_deleted(&self, order_no: &OrderNo) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_deleted(order_no, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_id(id, &mut conn).await?)
    }

    async fn fetch_order_by_order_no(&self, order_no: &OrderNo) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_order_no(order_no, &mut conn).await?)
    }

    async fn fetch_orders_for_member(&self, member_id: i64) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_member(member_id, &mut conn).await?)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(query, &mut conn).await?)
    }
}

impl FleetManagement for SqliteDatabase {
    async fn insert_machine(&self, machine: NewMachine) -> Result<Machine, StoreError> {
        let mut conn = self.pool.acquire().await?;
        machines::insert_machine(machine, &mut conn).await
    }

    async fn fetch_machine(&self, id: i64) -> Result<Option<Machine>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(machines::fetch_machine(id, &mut conn).await?)
    }

    async fn set_business_status(
        &self,
        machine_id: i64,
        status: BusinessStatus,
        version: i64,
    ) -> Result<Option<Machine>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        machines::set_business_status(machine_id, status, version, &mut conn).await
    }

    async fn insert_silo(&self, silo: NewSilo) -> Result<MaterialSilo, StoreError> {
        let mut conn = self.pool.acquire().await?;
        silos::insert_silo(silo, &mut conn).await
    }

    async fn fetch_silo(&self, id: i64) -> Result<Option<MaterialSilo>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(silos::fetch_silo(id, &mut conn).await?)
    }

    async fn fetch_silos_for_machine(&self, machine_id: i64) -> Result<Vec<MaterialSilo>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(silos::fetch_silos_for_machine(machine_id, &mut conn).await?)
    }

    async fn fetch_silo_for_product(
        &self,
        machine_id: i64,
        product_id: i64,
    ) -> Result<Option<MaterialSilo>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(silos::fetch_silo_for_product(machine_id, product_id, &mut conn).await?)
    }

    async fn update_silo_stock(
        &self,
        silo_id: i64,
        stock: i64,
        version: i64,
    ) -> Result<Option<MaterialSilo>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        silos::update_stock(silo_id, stock, version, &mut conn).await
    }

    async fn assign_silo_product(
        &self,
        silo_id: i64,
        product_id: i64,
        version: i64,
    ) -> Result<Option<MaterialSilo>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        silos::assign_product(silo_id, product_id, version, &mut conn).await
    }

    async fn set_silo_sale_status(
        &self,
        silo_id: i64,
        status: SaleStatus,
        version: i64,
    ) -> Result<Option<MaterialSilo>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        silos::set_sale_status(silo_id, status, version, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_member(&self, member: NewMember) -> Result<Member, StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_member(member, &mut conn).await
    }

    async fn fetch_member(&self, id: i64) -> Result<Option<Member>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_member(id, &mut conn).await?)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_product(product, &mut conn).await
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_product(id, &mut conn).await?)
    }
}
