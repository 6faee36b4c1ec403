use std::fmt::Debug;

use log::*;

use crate::{
    api::{errors::InventoryError, ownership::OwnershipValidator},
    db_types::{MaterialSilo, SaleStatus},
    traits::{StoreError, VendingDatabase},
};

/// `InventoryApi` owns the material-silo invariants:
///
/// * `0 ≤ stock ≤ max_capacity` after every stock write, violating writes rejected unchanged;
/// * `sale_status = On` implies a product is assigned and stock is positive.
///
/// All three mutations are owner-privileged and use the silo's version counter for optimistic
/// concurrency: a lost race surfaces as [`StoreError::ConcurrentUpdate`] and the caller retries
/// with fresh state.
pub struct InventoryApi<B> {
    db: B,
    ownership: OwnershipValidator<B>,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi")
    }
}

impl<B: Clone> InventoryApi<B> {
    pub fn new(db: B) -> Self {
        let ownership = OwnershipValidator::new(db.clone());
        Self { db, ownership }
    }
}

impl<B> InventoryApi<B>
where B: VendingDatabase
{
    /// Sets the silo's stock to an absolute value. Callers compute deltas from dispense and
    /// replenishment events upstream; the engine only enforces the bounds.
    ///
    /// Setting stock to zero on a silo that is on sale also turns the sale off in the same
    /// write, so the "on sale implies stocked" invariant holds at rest.
    pub async fn update_stock(&self, silo_id: i64, actor: i64, new_stock: i64) -> Result<MaterialSilo, InventoryError> {
        let silo = self.load_guarded(silo_id, actor).await?;
        if new_stock < 0 {
            return Err(InventoryError::InvalidStock(new_stock));
        }
        if new_stock > silo.max_capacity {
            return Err(InventoryError::StockExceedsCapacity { requested: new_stock, max_capacity: silo.max_capacity });
        }
        match self.db.update_silo_stock(silo_id, new_stock, silo.version).await? {
            Some(updated) => {
                debug!(
                    "📦️ Silo #{silo_id} stock set to {new_stock}/{} (sale {})",
                    updated.max_capacity, updated.sale_status
                );
                Ok(updated)
            },
            None => Err(self.stale_or_missing(silo_id).await),
        }
    }

    /// Associates a product with the silo. Sale status is untouched — a freshly assigned silo
    /// still has to be switched on explicitly.
    pub async fn assign_product(
        &self,
        silo_id: i64,
        actor: i64,
        product_id: i64,
    ) -> Result<MaterialSilo, InventoryError> {
        let silo = self.load_guarded(silo_id, actor).await?;
        self.db.fetch_product(product_id).await?.ok_or(InventoryError::ProductNotFound(product_id))?;
        match self.db.assign_silo_product(silo_id, product_id, silo.version).await? {
            Some(updated) => {
                debug!("📦️ Silo #{silo_id} now carries product #{product_id}");
                Ok(updated)
            },
            None => Err(self.stale_or_missing(silo_id).await),
        }
    }

    /// Switches a silo's sale status. Turning off is always permitted. Turning on requires a
    /// product to be assigned (checked first) and positive stock — selling an unassigned or
    /// empty slot is refused with an explicit, actionable error rather than silently ignored.
    pub async fn set_sale_status(
        &self,
        silo_id: i64,
        actor: i64,
        desired: SaleStatus,
    ) -> Result<MaterialSilo, InventoryError> {
        let silo = self.load_guarded(silo_id, actor).await?;
        if desired == SaleStatus::On {
            if silo.product_id.is_none() {
                return Err(InventoryError::ProductNotAssigned(silo_id));
            }
            if silo.stock <= 0 {
                return Err(InventoryError::StockEmpty(silo_id));
            }
        }
        match self.db.set_silo_sale_status(silo_id, desired, silo.version).await? {
            Some(updated) => {
                info!("📦️ Silo #{silo_id} sale status set to {desired}");
                Ok(updated)
            },
            None => Err(self.stale_or_missing(silo_id).await),
        }
    }

    async fn load_guarded(&self, silo_id: i64, actor: i64) -> Result<MaterialSilo, InventoryError> {
        let silo = self.db.fetch_silo(silo_id).await?.ok_or(InventoryError::SiloNotFound(silo_id))?;
        self.ownership.validate(silo.machine_id, actor).await?;
        Ok(silo)
    }

    async fn stale_or_missing(&self, silo_id: i64) -> InventoryError {
        match self.db.fetch_silo(silo_id).await {
            Ok(Some(_)) => StoreError::ConcurrentUpdate { entity: "material_silo", id: silo_id }.into(),
            Ok(None) => InventoryError::SiloNotFound(silo_id),
            Err(e) => e.into(),
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
