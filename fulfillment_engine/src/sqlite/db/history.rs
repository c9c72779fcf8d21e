use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderNumber, StatusHistoryEntry},
    state_machine::Transition,
};

/// Appends a ledger entry for a committed transition.
pub async fn insert_entry(
    order_id: i64,
    transition: &Transition,
    notes: Option<&str>,
    changed_by: &str,
    conn: &mut SqliteConnection,
) -> Result<StatusHistoryEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO order_status_history (order_id, from_status, to_status, notes, changed_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(transition.from)
    .bind(transition.to)
    .bind(notes)
    .bind(changed_by)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Returns the full ledger for an order, oldest entry first. Includes the creation row the trigger wrote, so the
/// result is non-empty for any existing order.
pub async fn history_for_order(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
    let entries = sqlx::query_as(
        r#"
            SELECT h.* FROM order_status_history h
            JOIN orders o ON o.id = h.order_id
            WHERE o.order_number = $1
            ORDER BY h.id ASC
        "#,
    )
    .bind(order_number.as_str())
    .fetch_all(conn)
    .await?;
    Ok(entries)
}
