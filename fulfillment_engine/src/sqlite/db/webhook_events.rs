use log::debug;
use sqlx::SqliteConnection;

/// Records a webhook event id in the replay ledger. Returns `true` on first sight and `false` when the gateway has
/// delivered the event before. `INSERT OR IGNORE` makes the check and the recording one atomic statement.
pub async fn record_event(event_id: &str, event_type: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO webhook_events (event_id, event_type) VALUES ($1, $2)")
        .bind(event_id)
        .bind(event_type)
        .execute(conn)
        .await?;
    let first_delivery = result.rows_affected() == 1;
    if !first_delivery {
        debug!("📝️ Webhook event {event_id} has been seen before");
    }
    Ok(first_delivery)
}
