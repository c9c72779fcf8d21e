use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Order, ReviewRequest};

/// Schedules a review request for the order. At most one request exists per order; rescheduling is a no-op.
pub async fn schedule(order: &Order, due_at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO review_requests (order_id, order_number, customer_id, due_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id) DO NOTHING;
        "#,
    )
    .bind(order.id)
    .bind(order.order_number.as_str())
    .bind(&order.customer_id)
    .bind(due_at)
    .execute(conn)
    .await?;
    if result.rows_affected() > 0 {
        debug!("📝️ Review request for order {} scheduled for {due_at}", order.order_number);
    }
    Ok(())
}

/// Returns unsent review requests due at or before `now`, soonest first.
pub async fn due_requests(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<ReviewRequest>, sqlx::Error> {
    let requests =
        sqlx::query_as("SELECT * FROM review_requests WHERE sent_at IS NULL AND due_at <= $1 ORDER BY due_at ASC")
            .bind(now)
            .fetch_all(conn)
            .await?;
    Ok(requests)
}

pub async fn mark_sent(id: i64, sent_at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE review_requests SET sent_at = $1 WHERE id = $2").bind(sent_at).bind(id).execute(conn).await?;
    Ok(())
}
