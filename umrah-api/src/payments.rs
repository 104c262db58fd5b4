use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use umrah_shared::Masked;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::packages::body;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub package_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: Option<Masked<String>>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/create-payment-intent", post(create_payment_intent))
}

/// POST /api/create-payment-intent
/// Opens a processor intent for the caller's package total
async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let request = body(payload)?;
    let intent = state.payments.create_payment_intent(user, request.package_id).await?;

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
