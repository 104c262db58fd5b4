use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use umrah_core::RepositoryError;
use umrah_offer::SearchError;
use umrah_order::{OrderError, PaymentError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(msg) => AppError::ValidationError(msg),
            unsupported @ SearchError::RouteUnsupported { .. } => AppError::NotFoundError(unsupported.to_string()),
            SearchError::SearchFailed(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            not_found @ OrderError::NotFound(_) => AppError::NotFoundError(not_found.to_string()),
            OrderError::Validation(msg) => AppError::ValidationError(msg),
            OrderError::Conflict(msg) => AppError::ConflictError(msg),
            OrderError::Gateway(msg) => AppError::InternalServerError(format!("payment gateway: {}", msg)),
            OrderError::Storage(err) => err.into(),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature(reason) => {
                tracing::warn!("Webhook signature verification failed: {}", reason);
                AppError::ValidationError("Invalid signature".to_string())
            }
            PaymentError::MalformedEvent(msg) => AppError::ValidationError(format!("Webhook Error: {}", msg)),
            PaymentError::Storage(err) => err.into(),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Anyhow(anyhow::Error::new(err))
    }
}
