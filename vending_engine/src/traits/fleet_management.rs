use crate::{
    db_types::{BusinessStatus, Machine, MaterialSilo, SaleStatus},
    traits::{NewMachine, NewSilo, StoreError},
};

/// Machine and silo provisioning, lookups, and the version-guarded silo mutations.
///
/// The three silo mutations condition their write on the version counter read at load time and
/// return `None` when the record moved underneath the caller (lost update), so callers re-read
/// and retry with fresh state instead of clobbering a concurrent change.
#[allow(async_fn_in_trait)]
pub trait FleetManagement {
    async fn insert_machine(&self, machine: NewMachine) -> Result<Machine, StoreError>;

    async fn fetch_machine(&self, id: i64) -> Result<Option<Machine>, StoreError>;

    /// Stores the operator-controlled business status. `Offline` is derived, never stored.
    async fn set_business_status(
        &self,
        machine_id: i64,
        status: BusinessStatus,
        version: i64,
    ) -> Result<Option<Machine>, StoreError>;

    /// Creates a silo at machine provisioning time. The slot number is unique per machine.
    async fn insert_silo(&self, silo: NewSilo) -> Result<MaterialSilo, StoreError>;

    async fn fetch_silo(&self, id: i64) -> Result<Option<MaterialSilo>, StoreError>;

    async fn fetch_silos_for_machine(&self, machine_id: i64) -> Result<Vec<MaterialSilo>, StoreError>;

    /// The silo on the given machine that currently carries the given product, if any.
    async fn fetch_silo_for_product(&self, machine_id: i64, product_id: i64)
        -> Result<Option<MaterialSilo>, StoreError>;

    /// Absolute stock set. A write that leaves the silo empty also flips `sale_status` to `Off`
    /// in the same statement, keeping the "on sale implies stocked" invariant true at rest.
    async fn update_silo_stock(&self, silo_id: i64, stock: i64, version: i64)
        -> Result<Option<MaterialSilo>, StoreError>;

    /// Associates a product with the silo. Never touches the sale status.
    async fn assign_silo_product(
        &self,
        silo_id: i64,
        product_id: i64,
        version: i64,
    ) -> Result<Option<MaterialSilo>, StoreError>;

    async fn set_silo_sale_status(
        &self,
        silo_id: i64,
        status: SaleStatus,
        version: i64,
    ) -> Result<Option<MaterialSilo>, StoreError>;
}
