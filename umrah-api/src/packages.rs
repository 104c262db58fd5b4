use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use umrah_core::{
    CreatePackageRequest, FlightOption, HotelOption, NewFlightOption, NewHotelOption, NewRailwayOption,
    Package, PackageDetails, RailwayOption, UpdatePackageRequest,
};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/packages", get(list_packages).post(create_package))
        .route(
            "/api/packages/{id}",
            get(get_package).put(update_package).delete(delete_package),
        )
        .route("/api/packages/{id}/flight-options", post(add_flight_option))
        .route("/api/packages/{id}/hotel-options", post(add_hotel_option))
        .route("/api/packages/{id}/railway-options", post(add_railway_option))
}

/// Malformed bodies are the caller's fault, so they map to 400 like any
/// other validation failure.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

/// GET /api/packages
async fn list_packages(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<PackageDetails>>, AppError> {
    Ok(Json(state.packages.list(user).await?))
}

/// POST /api/packages
async fn create_package(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<CreatePackageRequest>, JsonRejection>,
) -> Result<Json<Package>, AppError> {
    let package = state.packages.create(user, body(payload)?).await?;
    Ok(Json(package))
}

/// GET /api/packages/{id}
async fn get_package(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<PackageDetails>, AppError> {
    Ok(Json(state.packages.get(user, id).await?))
}

/// PUT /api/packages/{id}
async fn update_package(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePackageRequest>, JsonRejection>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(state.packages.update(user, id, body(payload)?).await?))
}

/// DELETE /api/packages/{id}
async fn delete_package(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.packages.delete(user, id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

async fn add_flight_option(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<NewFlightOption>, JsonRejection>,
) -> Result<Json<FlightOption>, AppError> {
    let option = state.packages.add_flight_option(user, id, body(payload)?).await?;
    Ok(Json(option))
}

async fn add_hotel_option(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<NewHotelOption>, JsonRejection>,
) -> Result<Json<HotelOption>, AppError> {
    let option = state.packages.add_hotel_option(user, id, body(payload)?).await?;
    Ok(Json(option))
}

async fn add_railway_option(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<NewRailwayOption>, JsonRejection>,
) -> Result<Json<RailwayOption>, AppError> {
    let option = state.packages.add_railway_option(user, id, body(payload)?).await?;
    Ok(Json(option))
}
