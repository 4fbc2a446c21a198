use crate::db_types::Order;

/// The result of applying a payment outcome to an order. See
/// [`settle_payment`](crate::traits::FulfillmentDatabase::settle_payment).
#[derive(Debug, Clone)]
pub enum SettlementResult {
    /// No order carries the given payment reference. Webhook handlers log this and acknowledge the event anyway.
    UnknownReference,
    /// The order exists, but its current status does not admit the transition. The order is returned as it stands.
    NoChange(Order),
    /// The transition was applied. The returned order reflects the new status.
    Settled(Order),
}

impl SettlementResult {
    pub fn order(&self) -> Option<&Order> {
        match self {
            SettlementResult::UnknownReference => None,
            SettlementResult::NoChange(order) | SettlementResult::Settled(order) => Some(order),
        }
    }
}
