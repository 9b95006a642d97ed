use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::PageQuery;
use crate::models::Booking;
use crate::services::bookings::BookingRequest;
use crate::utils::{response, AppError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking).delete(cancel_booking))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.services.bookings.list(params.page()).await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.services.bookings.find(id).await?))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookingRequest>,
) -> Result<Response, AppError> {
    let booking = state.services.bookings.create(request).await?;
    Ok(response::created(booking))
}

/// Отмена: места освобождаются, бронь удаляется.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.bookings.cancel(id).await?;
    Ok(response::no_content())
}
