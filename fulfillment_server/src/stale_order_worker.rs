use chrono::Duration;
use fulfillment_engine::{db_types::Order, OrderFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::{ConfiguredRates, StripeGateway};

/// Starts the stale-order worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Once a minute, every `Pending` order older than `max_age` is cancelled and its inventory reservations are
/// released. These are orders whose customer wandered off before completing payment; a webhook that settles one of
/// them concurrently wins or loses against the sweep deterministically inside the cancellation transaction.
pub fn start_stale_order_worker(
    api: OrderFlowApi<SqliteDatabase, StripeGateway, ConfiguredRates>,
    max_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        info!("🕰️ Stale order worker started. Pending orders older than {} minutes will be cancelled.", max_age.num_minutes());
        loop {
            timer.tick().await;
            trace!("🕰️ Running stale order sweep");
            match api.cancel_stale_orders(max_age).await {
                Ok(cancelled) if cancelled.is_empty() => {
                    trace!("🕰️ No stale orders found");
                },
                Ok(cancelled) => {
                    info!("🕰️ {} stale orders cancelled", cancelled.len());
                    debug!("🕰️ Cancelled orders: {}", order_list(&cancelled));
                },
                Err(e) => {
                    error!("🕰️ Error running stale order sweep: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] order_id: {} cust_id: {}", o.id, o.order_id, o.customer_id))
        .collect::<Vec<String>>()
        .join(", ")
}
