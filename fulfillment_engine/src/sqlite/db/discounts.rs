use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::Discount, traits::FulfillmentError};

/// Looks up an active discount code. Codes are stored upper-cased, so the lookup normalises its input and is
/// case-insensitive.
pub async fn fetch_active_discount(code: &str, conn: &mut SqliteConnection) -> Result<Option<Discount>, sqlx::Error> {
    let discount = sqlx::query_as("SELECT * FROM discount_codes WHERE code = UPPER($1) AND is_active = 1")
        .bind(code)
        .fetch_optional(conn)
        .await?;
    Ok(discount)
}

/// Bumps the usage counter on a discount code. Call inside the transaction that persists the discounted order.
pub async fn increment_usage(code: &str, conn: &mut SqliteConnection) -> Result<(), FulfillmentError> {
    let result =
        sqlx::query("UPDATE discount_codes SET times_used = times_used + 1, updated_at = CURRENT_TIMESTAMP WHERE code = UPPER($1)")
            .bind(code)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(FulfillmentError::DiscountNotAvailable(code.to_string()));
    }
    trace!("📝️ Usage count incremented for discount code {code}");
    Ok(())
}
