use sqlx::SqliteConnection;

use crate::{
    db_types::{BusinessStatus, Machine},
    traits::{NewMachine, StoreError},
};

/// Registers a machine. Machines start closed; the owner opens them explicitly once silos are
/// provisioned and stocked.
pub async fn insert_machine(machine: NewMachine, conn: &mut SqliteConnection) -> Result<Machine, StoreError> {
    let device_code = machine.device_code.clone();
    let machine = sqlx::query_as(
        r#"
            INSERT INTO machines (owner_id, name, device_code)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(machine.owner_id)
    .bind(machine.name)
    .bind(machine.device_code)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => StoreError::DeviceCodeTaken(device_code),
        _ => StoreError::from(e),
    })?;
    Ok(machine)
}

pub async fn fetch_machine(id: i64, conn: &mut SqliteConnection) -> Result<Option<Machine>, sqlx::Error> {
    let machine = sqlx::query_as("SELECT * FROM machines WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(machine)
}

/// Stores the operator-controlled business status, conditioned on the version read at load
/// time. `Offline` is derived from device reachability and never stored.
pub(crate) async fn set_business_status(
    machine_id: i64,
    status: BusinessStatus,
    version: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Machine>, StoreError> {
    let machine = sqlx::query_as(
        r#"
            UPDATE machines
            SET business_status = $1,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND version = $3
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(machine_id)
    .bind(version)
    .fetch_optional(conn)
    .await?;
    Ok(machine)
}
