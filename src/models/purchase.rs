use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed transaction, one row per checkout line item.
///
/// `package_name` is denormalized from the line description; it is not a
/// foreign key. `stripe_session_id` is the dedup key for fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub package_name: String,
    /// Line total in minor currency units
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub stripe_session_id: String,
    #[serde(default)]
    pub stripe_payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const PURCHASE_STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize)]
pub struct CreatePurchase {
    pub email: String,
    pub name: Option<String>,
    pub package_name: String,
    pub amount: i64,
    pub currency: String,
    pub status: &'static str,
    pub stripe_session_id: String,
    pub stripe_payment_intent_id: Option<String>,
}
