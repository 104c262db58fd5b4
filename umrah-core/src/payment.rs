use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;
use crate::CoreResult;
use umrah_shared::Masked;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

/// What the payment processor needs to open an intent for a package.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    pub package_id: Uuid,
    pub user_id: UserId,
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub id: String, // Provider's ID (e.g., pi_123)
    pub package_id: Uuid,
    pub user_id: UserId,
    pub amount: i64,
    pub currency: String,
    pub status: IntentStatus,
    pub client_secret: Option<Masked<String>>,
    pub created_at: DateTime<Utc>,
}

/// The external payment processor. Package and user ids travel in the
/// intent's metadata and come back on the webhook.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &PaymentIntentRequest) -> CoreResult<PaymentIntent>;
}
