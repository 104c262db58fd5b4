use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use umrah_offer::models::{PackageSearchResults, TrainResults};
use umrah_offer::{SearchQuery, SearchResults, TrainQuery};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/search-options", post(search_options))
        .route("/api/search-packages", post(search_packages))
        .route("/api/trains", get(list_trains))
}

/// POST /api/search-options
/// Flights, hotels per holy city and trains for a route
async fn search_options(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<SearchResults>, AppError> {
    Ok(Json(state.search.search_options(query).await?))
}

/// POST /api/search-packages
async fn search_packages(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<PackageSearchResults>, AppError> {
    Ok(Json(state.search.search_packages(query).await?))
}

/// GET /api/trains?from=&to=&date=
async fn list_trains(
    State(state): State<AppState>,
    Query(query): Query<TrainQuery>,
) -> Result<Json<TrainResults>, AppError> {
    Ok(Json(state.search.list_trains(query).await?))
}
