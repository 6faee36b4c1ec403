use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{MaterialSilo, SaleStatus},
    traits::{NewSilo, StoreError},
};

/// Creates a silo at machine provisioning time: unassigned, empty, off sale.
pub async fn insert_silo(silo: NewSilo, conn: &mut SqliteConnection) -> Result<MaterialSilo, StoreError> {
    let (machine_id, silo_number) = (silo.machine_id, silo.silo_number);
    let silo = sqlx::query_as(
        r#"
            INSERT INTO material_silos (machine_id, silo_number, max_capacity)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(silo.machine_id)
    .bind(silo.silo_number)
    .bind(silo.max_capacity)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            StoreError::SiloNumberTaken { machine_id, silo_number }
        },
        _ => StoreError::from(e),
    })?;
    Ok(silo)
}

pub async fn fetch_silo(id: i64, conn: &mut SqliteConnection) -> Result<Option<MaterialSilo>, sqlx::Error> {
    let silo = sqlx::query_as("SELECT * FROM material_silos WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(silo)
}

pub async fn fetch_silos_for_machine(
    machine_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<MaterialSilo>, sqlx::Error> {
    let silos = sqlx::query_as("SELECT * FROM material_silos WHERE machine_id = $1 ORDER BY silo_number ASC")
        .bind(machine_id)
        .fetch_all(conn)
        .await?;
    Ok(silos)
}

/// The silo on the machine currently carrying the product, if any. Slot numbers are unique per
/// machine and a product occupies at most one slot, so the lowest slot wins if data drifts.
pub async fn fetch_silo_for_product(
    machine_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<MaterialSilo>, sqlx::Error> {
    let silo = sqlx::query_as(
        "SELECT * FROM material_silos WHERE machine_id = $1 AND product_id = $2 ORDER BY silo_number ASC LIMIT 1",
    )
    .bind(machine_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(silo)
}

/// Absolute stock set, conditioned on the version read at load time. A write that empties the
/// silo also flips the sale status off in the same statement, keeping the sale invariant true
/// at rest.
pub(crate) async fn update_stock(
    silo_id: i64,
    stock: i64,
    version: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<MaterialSilo>, StoreError> {
    let silo: Option<MaterialSilo> = sqlx::query_as(
        r#"
            UPDATE material_silos
            SET stock = $1,
                sale_status = CASE WHEN $1 <= 0 THEN 'Off' ELSE sale_status END,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND version = $3
            RETURNING *;
        "#,
    )
    .bind(stock)
    .bind(silo_id)
    .bind(version)
    .fetch_optional(conn)
    .await?;
    if let Some(s) = &silo {
        debug!("📦️ Silo #{} stock is now {}/{}", s.id, s.stock, s.max_capacity);
    }
    Ok(silo)
}

pub(crate) async fn assign_product(
    silo_id: i64,
    product_id: i64,
    version: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<MaterialSilo>, StoreError> {
    let silo = sqlx::query_as(
        r#"
            UPDATE material_silos
            SET product_id = $1,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND version = $3
            RETURNING *;
        "#,
    )
    .bind(product_id)
    .bind(silo_id)
    .bind(version)
    .fetch_optional(conn)
    .await?;
    Ok(silo)
}

pub(crate) async fn set_sale_status(
    silo_id: i64,
    status: SaleStatus,
    version: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<MaterialSilo>, StoreError> {
    let silo = sqlx::query_as(
        r#"
            UPDATE material_silos
            SET sale_status = $1,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND version = $3
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(silo_id)
    .bind(version)
    .fetch_optional(conn)
    .await?;
    Ok(silo)
}
