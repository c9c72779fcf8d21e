use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderNumber},
    state_machine::Transition,
    traits::{FulfillmentError, TransitionContext},
};

/// Inserts the order into the database, returning `false` in the second element if the order already exists.
///
/// The uniqueness check happens inside the INSERT itself, so two simultaneous checkouts for the same order number
/// both land here safely: exactly one wins the insert, the other reads the winner's row back.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), FulfillmentError> {
    let order_number = order.order_number.clone();
    if let Some(order) = insert_order(order, conn).await? {
        debug!("📝️ Order {} inserted with id {}", order.order_number, order.id);
        return Ok((order, true));
    }
    let order = fetch_order_by_number(&order_number, conn).await?.ok_or_else(|| {
        FulfillmentError::DatabaseError(format!("Order {order_number} exists but could not be read back"))
    })?;
    Ok((order, false))
}

/// Inserts a new order, returning `None` when a row with the same order number already exists.
///
/// The creation ledger row is written by a database trigger, so every order's history starts non-empty.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, FulfillmentError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                total,
                currency,
                created_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.customer_id)
    .bind(order.total.value())
    .bind(order.currency)
    .bind(order.created_at)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Returns all orders for a customer, newest first.
pub async fn orders_for_customer(customer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Applies a transition to the order projection row.
///
/// The update is predicated on the row still holding the transition's `from` status. Returns `None` when the
/// predicate matched nothing, which means a rival writer got there first and the caller must roll back.
///
/// Side-effect columns only move when the transition says so: `paid_at` is stamped when the transition records
/// payment, `reference_number` is assigned only if it is still NULL, and tracking fields change only on transitions
/// that record shipment data.
pub async fn update_projection(
    order: &Order,
    transition: &Transition,
    ctx: &TransitionContext,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let effects = &transition.side_effects;
    let reference = if effects.assign_reference_number { ctx.reference_number.as_deref() } else { None };
    let (tracking, carrier) = if effects.record_tracking {
        (ctx.tracking_number.as_deref(), ctx.carrier.as_deref())
    } else {
        (None, None)
    };
    let updated = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                updated_at = CURRENT_TIMESTAMP,
                paid_at = CASE WHEN $2 THEN CURRENT_TIMESTAMP ELSE paid_at END,
                reference_number = COALESCE(reference_number, $3),
                tracking_number = COALESCE($4, tracking_number),
                carrier = COALESCE($5, carrier)
            WHERE id = $6 AND status = $7
            RETURNING *;
        "#,
    )
    .bind(transition.to)
    .bind(effects.record_paid_at)
    .bind(reference)
    .bind(tracking)
    .bind(carrier)
    .bind(order.id)
    .bind(transition.from)
    .fetch_optional(conn)
    .await?;
    Ok(updated)
}
