use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use umrah_core::{
    BookingInsert, BookingRepository, NewBooking, PackageRepository, PackageStatus, RepositoryError,
    TransitionOutcome, UserId,
};
use umrah_shared::models::events::{BookingConfirmedEvent, PackageStatusChangedEvent};
use umrah_shared::from_minor_units;

use crate::signature::{SignatureError, WebhookVerifier};

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("malformed payment event: {0}")]
    MalformedEvent(String),

    #[error("booking could not be recorded: {0}")]
    Storage(#[from] RepositoryError),
}

/// The processor's event envelope. `data.object` is only interpreted for
/// event types this service acts on.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The payment intent carried by `payment_intent.*` events.
#[derive(Debug, Deserialize)]
pub struct IntentObject {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    pub metadata: IntentMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    pub package_id: Uuid,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// A booking exists for the package; `created` is false on redelivery.
    BookingConfirmed { booking_id: Uuid, created: bool },
    PaymentFailed { package_id: Uuid },
    Ignored { event_type: String },
}

/// Applies payment processor notifications to packages and bookings.
pub struct PaymentEventHandler {
    packages: Arc<dyn PackageRepository>,
    bookings: Arc<dyn BookingRepository>,
    verifier: WebhookVerifier,
}

impl PaymentEventHandler {
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        bookings: Arc<dyn BookingRepository>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            packages,
            bookings,
            verifier,
        }
    }

    /// Verifies and applies one webhook delivery. Nothing is read or written
    /// unless the signature checks out.
    pub async fn handle(&self, payload: &[u8], signature: Option<&str>) -> Result<EventOutcome, PaymentError> {
        let now = chrono::Utc::now().timestamp();
        if let Err(err) = self.verifier.verify(signature, payload, now) {
            warn!("Rejected webhook delivery: {}", err);
            return Err(err.into());
        }

        let event: PaymentEvent =
            serde_json::from_slice(payload).map_err(|e| PaymentError::MalformedEvent(e.to_string()))?;
        debug!("Received payment event {} ({})", event.id, event.event_type);

        match event.event_type.as_str() {
            PAYMENT_SUCCEEDED => self.payment_succeeded(intent(event.data.object)?).await,
            PAYMENT_FAILED => self.payment_failed(intent(event.data.object)?).await,
            other => {
                info!("Ignoring unhandled payment event type {}", other);
                Ok(EventOutcome::Ignored {
                    event_type: other.to_string(),
                })
            }
        }
    }

    async fn payment_succeeded(&self, intent: IntentObject) -> Result<EventOutcome, PaymentError> {
        let package_id = intent.metadata.package_id;
        let user_id = intent
            .metadata
            .user_id
            .ok_or_else(|| PaymentError::MalformedEvent("metadata.userId is required".to_string()))?;
        if intent.amount < 0 {
            return Err(PaymentError::MalformedEvent("amount must not be negative".to_string()));
        }

        // The booking is the durable proof of payment, so it is written first.
        let fields = NewBooking {
            package_id,
            user_id,
            total_amount: from_minor_units(intent.amount),
            currency: intent.currency.to_uppercase(),
            payment_intent_id: intent.id,
            confirmation_number: format!("UMR-{}", chrono::Utc::now().timestamp_millis()),
        };
        let inserted = self.bookings.create_booking(&fields).await?;
        let booking = inserted.booking().clone();

        if let BookingInsert::Existing(_) = inserted {
            info!("Booking {} already recorded for package {}", booking.id, package_id);
        } else {
            let event = BookingConfirmedEvent {
                booking_id: booking.id,
                package_id,
                user_id: user_id.as_uuid(),
                confirmation_number: booking.confirmation_number.clone(),
                total_amount: booking.total_amount,
                currency: booking.currency.clone(),
                timestamp: booking.created_at.timestamp(),
            };
            info!(
                "Booking {} confirmed for package {}: {}",
                booking.id,
                package_id,
                serde_json::to_string(&event).unwrap_or_default()
            );
        }

        self.mark_package(package_id, PackageStatus::Booked, "payment succeeded").await;

        Ok(EventOutcome::BookingConfirmed {
            booking_id: booking.id,
            created: inserted.is_new(),
        })
    }

    async fn payment_failed(&self, intent: IntentObject) -> Result<EventOutcome, PaymentError> {
        let package_id = intent.metadata.package_id;
        // Back to draft so the user can retry; booked packages stay booked.
        self.mark_package(package_id, PackageStatus::Draft, "payment failed").await;
        Ok(EventOutcome::PaymentFailed { package_id })
    }

    // A failed status update after the booking is committed is logged and
    // left for reconciliation rather than failing the delivery.
    async fn mark_package(&self, package_id: Uuid, to: PackageStatus, reason: &str) {
        match self
            .packages
            .transition_status(package_id, PackageStatus::Draft, to)
            .await
        {
            Ok(TransitionOutcome::Applied) => {
                let event = PackageStatusChangedEvent {
                    package_id,
                    from: PackageStatus::Draft.to_string(),
                    to: to.to_string(),
                    reason: reason.to_string(),
                    timestamp: chrono::Utc::now().timestamp(),
                };
                info!(
                    "Package {} status {} -> {} ({})",
                    event.package_id, event.from, event.to, event.reason
                );
            }
            Ok(TransitionOutcome::Skipped(current)) if current == to => {
                debug!("Package {} already {}", package_id, current);
            }
            Ok(TransitionOutcome::Skipped(current)) => {
                warn!(
                    "Package {} is {}, not draft; leaving status unchanged after {}",
                    package_id, current, reason
                );
            }
            Ok(TransitionOutcome::Missing) => {
                warn!("Package {} not found while handling {}", package_id, reason);
            }
            Err(err) => {
                warn!(
                    "Package {} status update to {} failed after {}: {}",
                    package_id, to, reason, err
                );
            }
        }
    }
}

fn intent(object: serde_json::Value) -> Result<IntentObject, PaymentError> {
    serde_json::from_value(object).map_err(|e| PaymentError::MalformedEvent(e.to_string()))
}
