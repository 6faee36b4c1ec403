use std::fmt::Debug;

use log::*;

use crate::{
    api::{errors::FleetError, order_objects::OrderQueryFilter, ownership::OwnershipValidator},
    db_types::{BusinessStatus, Machine, MachineStatus, MaterialSilo, Order},
    traits::{DeviceAvailabilityChecker, NewMachine, NewSilo, StoreError, VendingDatabase},
};

/// `FleetApi` provisions machines and their silos, toggles the operator-controlled business
/// status, and derives the externally visible machine status from device reachability.
pub struct FleetApi<B, D> {
    db: B,
    device_checker: D,
    ownership: OwnershipValidator<B>,
}

impl<B, D> Debug for FleetApi<B, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FleetApi")
    }
}

impl<B: Clone, D> FleetApi<B, D> {
    pub fn new(db: B, device_checker: D) -> Self {
        let ownership = OwnershipValidator::new(db.clone());
        Self { db, device_checker, ownership }
    }
}

impl<B, D> FleetApi<B, D>
where
    B: VendingDatabase,
    D: DeviceAvailabilityChecker,
{
    pub async fn register_machine(&self, machine: NewMachine) -> Result<Machine, FleetError> {
        let machine = self.db.insert_machine(machine).await?;
        info!("🏪️ Machine #{} ({}) registered for owner {}", machine.id, machine.name, machine.owner_id);
        Ok(machine)
    }

    /// Adds a dispensing slot to a machine at provisioning time. Slot numbers are unique per
    /// machine; the silo starts unassigned, empty and off sale.
    pub async fn add_silo(&self, silo: NewSilo) -> Result<MaterialSilo, FleetError> {
        self.db
            .fetch_machine(silo.machine_id)
            .await?
            .ok_or(FleetError::MachineNotFound(silo.machine_id))?;
        let silo = self.db.insert_silo(silo).await?;
        info!("🏪️ Silo #{} (slot {}) added to machine #{}", silo.id, silo.silo_number, silo.machine_id);
        Ok(silo)
    }

    /// Stores a new business status on behalf of the machine's owner. Only `Open` and `Close`
    /// can be stored; `Offline` is derived from reachability and never persisted.
    pub async fn set_business_status(
        &self,
        machine_id: i64,
        actor: i64,
        status: BusinessStatus,
    ) -> Result<Machine, FleetError> {
        let machine = self.ownership.validate(machine_id, actor).await?;
        if machine.business_status == status {
            return Ok(machine);
        }
        match self.db.set_business_status(machine_id, status, machine.version).await? {
            Some(machine) => {
                info!("🏪️ Machine #{machine_id} business status set to {status}");
                Ok(machine)
            },
            None => Err(StoreError::ConcurrentUpdate { entity: "machine", id: machine_id }.into()),
        }
    }

    /// The externally visible status of a machine. A stored `Open`/`Close` is overridden by
    /// `Offline` whenever the controller is unreachable — including when the probe itself fails.
    pub async fn machine_status(&self, machine_id: i64) -> Result<MachineStatus, FleetError> {
        let machine =
            self.db.fetch_machine(machine_id).await?.ok_or(FleetError::MachineNotFound(machine_id))?;
        let online = self.device_checker.is_online(&machine.device_code).await.unwrap_or_else(|e| {
            warn!("📡️ Device probe for {} failed: {e}. Reporting the machine as offline.", machine.device_code);
            false
        });
        if online {
            Ok(machine.business_status.into())
        } else {
            Ok(MachineStatus::Offline)
        }
    }

    pub async fn silos_for_machine(&self, machine_id: i64) -> Result<Vec<MaterialSilo>, FleetError> {
        self.db.fetch_machine(machine_id).await?.ok_or(FleetError::MachineNotFound(machine_id))?;
        Ok(self.db.fetch_silos_for_machine(machine_id).await?)
    }

    /// The owner's sales and refund view over a machine's orders.
    pub async fn orders_for_machine(
        &self,
        machine_id: i64,
        actor: i64,
        filter: OrderQueryFilter,
    ) -> Result<Vec<Order>, FleetError> {
        self.ownership.validate(machine_id, actor).await?;
        let filter = filter.with_machine_id(machine_id);
        Ok(self.db.search_orders(filter).await?)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
