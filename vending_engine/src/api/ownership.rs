use log::warn;

use crate::{api::errors::AccessError, db_types::Machine, traits::FleetManagement};

/// Confirms that an actor controls a machine before any owner-privileged mutation (refund,
/// business-status toggle, inventory changes). Actor identity comes from the external auth
/// layer; the engine never issues or validates credentials itself.
#[derive(Debug, Clone)]
pub struct OwnershipValidator<B> {
    db: B,
}

impl<B> OwnershipValidator<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OwnershipValidator<B>
where B: FleetManagement
{
    /// Returns the machine when `actor` owns it.
    pub async fn validate(&self, machine_id: i64, actor: i64) -> Result<Machine, AccessError> {
        let machine = self
            .db
            .fetch_machine(machine_id)
            .await
            .map_err(AccessError::from)?
            .ok_or(AccessError::MachineNotFound(machine_id))?;
        if machine.owner_id != actor {
            warn!(
                "🔐️ Owner {actor} attempted a privileged action on machine {machine_id}, which belongs to owner {}",
                machine.owner_id
            );
            return Err(AccessError::PermissionDenied { machine_id, actor });
        }
        Ok(machine)
    }
}
