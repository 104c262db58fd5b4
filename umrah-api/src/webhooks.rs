use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use umrah_order::EventOutcome;

use crate::error::AppError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/webhooks/stripe", post(handle_stripe_webhook))
}

/// POST /api/webhooks/stripe
/// The signature covers the exact bytes sent, so the body is taken raw.
async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    match state.webhooks.handle(&payload, signature).await? {
        EventOutcome::BookingConfirmed { booking_id, created } => {
            tracing::info!("Webhook processed: booking {} (new: {})", booking_id, created);
        }
        EventOutcome::PaymentFailed { package_id } => {
            tracing::info!("Webhook processed: payment failed for package {}", package_id);
        }
        EventOutcome::Ignored { event_type } => {
            tracing::debug!("Webhook acknowledged without action: {}", event_type);
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
