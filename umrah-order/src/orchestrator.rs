use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use umrah_core::{
    CoreResult, IntentStatus, PackageRepository, PackageStatus, PaymentGateway, PaymentIntent,
    PaymentIntentRequest, UserId,
};
use umrah_shared::{to_minor_units, Masked};

use crate::manager::OrderError;

/// Opens payment intents for packages the caller owns. The package and user
/// ids ride along as metadata so the webhook can find them again.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    packages: Arc<dyn PackageRepository>,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, packages: Arc<dyn PackageRepository>, currency: String) -> Self {
        Self {
            gateway,
            packages,
            currency,
        }
    }

    pub async fn create_payment_intent(&self, user_id: UserId, package_id: Uuid) -> Result<PaymentIntent, OrderError> {
        let package = self
            .packages
            .get_package(user_id, package_id)
            .await?
            .ok_or_else(|| OrderError::NotFound("Package".to_string()))?
            .package;

        if package.status != PackageStatus::Draft {
            return Err(OrderError::Conflict(format!(
                "Package {} is {} and cannot be paid for again",
                package.id, package.status
            )));
        }

        let amount = to_minor_units(package.total_price)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| OrderError::Validation("Package total must be a positive amount".to_string()))?;

        let request = PaymentIntentRequest {
            package_id,
            user_id,
            amount,
            currency: self.currency.to_lowercase(),
        };
        let intent = self.gateway.create_intent(&request).await?;
        info!(
            "Payment intent {} opened for package {} ({} {})",
            intent.id, package_id, intent.amount, intent.currency
        );
        Ok(intent)
    }
}

/// Local stand-in for the payment processor. Intents it opens are never
/// settled on their own; payment outcomes arrive through signed webhooks.
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(&self, request: &PaymentIntentRequest) -> CoreResult<PaymentIntent> {
        let id = format!("mock_pi_{}", Uuid::new_v4().simple());
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();

        Ok(PaymentIntent {
            client_secret: Some(Masked(format!("{}_secret_{}", id, nonce))),
            id,
            package_id: request.package_id,
            user_id: request.user_id,
            amount: request.amount,
            currency: request.currency.clone(),
            status: IntentStatus::RequiresPaymentMethod,
            created_at: chrono::Utc::now(),
        })
    }
}
