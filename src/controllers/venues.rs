use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::PageQuery;
use crate::models::Venue;
use crate::services::venues::VenueRequest;
use crate::utils::{response, AppError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues", get(list_venues).post(create_venue))
        .route("/venues/{id}", get(get_venue).delete(delete_venue))
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<Venue>>, AppError> {
    let venues = state.services.venues.list(params.page()).await?;
    Ok(Json(venues))
}

pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Venue>, AppError> {
    Ok(Json(state.services.venues.find(id).await?))
}

pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VenueRequest>,
) -> Result<Response, AppError> {
    let venue = state.services.venues.create(request).await?;
    Ok(response::created(venue))
}

pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.venues.delete(id).await?;
    Ok(response::no_content())
}
