use axum::{extract::State, routing::get, Extension, Json, Router};

use umrah_core::BookingDetails;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bookings", get(list_bookings))
}

/// GET /api/bookings
/// The caller's bookings, newest first, each with its package summary
async fn list_bookings(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    Ok(Json(state.bookings.list_bookings(user).await?))
}
