use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{MakeStatus, NewOrder, Order, OrderNo, PaymentStatus},
    order_objects::OrderQueryFilter,
    traits::StoreError,
};

/// Inserts a new order in `{WaitPay, WaitMake}` state. Order numbers are unique and never
/// reused; a duplicate maps to [`StoreError::OrderAlreadyExists`].
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let order_no = order.order_no.clone();
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_no,
                member_id,
                machine_id,
                product_id,
                has_cup,
                total_amount,
                pay_amount
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.order_no)
    .bind(order.member_id)
    .bind(order.machine_id)
    .bind(order.product_id)
    .bind(order.has_cup)
    .bind(order.total_amount)
    .bind(order.pay_amount)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => StoreError::OrderAlreadyExists(order_no),
        _ => StoreError::from(e),
    })?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_no(
    order_no: &OrderNo,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_no = $1 AND deleted_at IS NULL")
        .bind(order_no.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_member(
    member_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders =
        sqlx::query_as("SELECT * FROM orders WHERE member_id = $1 AND deleted_at IS NULL ORDER BY created_at ASC")
            .bind(member_id)
            .fetch_all(conn)
            .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE deleted_at IS NULL");
    if let Some(order_no) = query.order_no {
        builder.push(" AND order_no = ").push_bind(order_no.0);
    }
    if let Some(member_id) = query.member_id {
        builder.push(" AND member_id = ").push_bind(member_id);
    }
    if let Some(machine_id) = query.machine_id {
        builder.push(" AND machine_id = ").push_bind(machine_id);
    }
    if query.payment_status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.payment_status.iter().flatten().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        builder.push(format!(" AND payment_status IN ({statuses})"));
    }
    if query.make_status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses = query.make_status.iter().flatten().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        builder.push(format!(" AND make_status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        builder.push(" AND created_at >= ").push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND created_at <= ").push_bind(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("🧾️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🧾️ Order search returned {} rows", orders.len());
    Ok(orders)
}

/// The WaitPay→Paid compare-and-swap. The `WHERE payment_status = 'WaitPay'` clause is the
/// atomic guard that makes duplicated payment callbacks safe: of N concurrent attempts exactly
/// one row update happens, and the losers see `None`.
pub(crate) async fn mark_paid(
    order_no: &OrderNo,
    channel_order_no: &str,
    paid_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = 'Paid',
                channel_order_no = $1,
                payment_time = $2,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_no = $3 AND payment_status = 'WaitPay' AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(channel_order_no)
    .bind(paid_at)
    .bind(order_no.as_str())
    .fetch_optional(conn)
    .await?;
    if let Some(o) = &order {
        debug!("🧾️ Order [{}] is now {}", o.order_no, o.payment_status);
    }
    Ok(order)
}

/// WaitPay→Invalid, for failed/cancelled/timed-out payment attempts. Same guard semantics as
/// [`mark_paid`].
pub(crate) async fn mark_invalid(order_no: &OrderNo, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = 'Invalid',
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_no = $1 AND payment_status = 'WaitPay' AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(order_no.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Paid→Refunded. Guarded on `Paid`, so at most one refund can ever apply; `refund_amount` is
/// copied from `pay_amount` inside the statement.
pub(crate) async fn refund(
    id: i64,
    reason: &str,
    refund_time: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = 'Refunded',
                refund_time = $1,
                refund_amount = pay_amount,
                refund_reason = $2,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND payment_status = 'Paid' AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(refund_time)
    .bind(reason)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Advances `make_status` from `from` to `to`. A transition into `Making` additionally requires
/// the order to be paid; dispense never starts against an unpaid order.
pub(crate) async fn set_make_status(
    order_no: &OrderNo,
    from: MakeStatus,
    to: MakeStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let payment_guard =
        if to == MakeStatus::Making { format!(" AND payment_status = '{}'", PaymentStatus::Paid) } else { String::new() };
    let sql = format!(
        r#"
            UPDATE orders
            SET make_status = $1,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_no = $2 AND make_status = $3 AND deleted_at IS NULL{payment_guard}
            RETURNING *;
        "#
    );
    let order = sqlx::query_as(&sql)
        .bind(to.to_string())
        .bind(order_no.as_str())
        .bind(from.to_string())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Soft-marks the order. Already-marked rows are left alone.
pub(crate) async fn mark_deleted(order_no: &OrderNo, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET deleted_at = CURRENT_TIMESTAMP,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_no = $1 AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(order_no.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
