use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::PageQuery;
use crate::models::{Event, EventCategory};
use crate::utils::{response, AppError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/event-categories", get(list_categories).post(create_category))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event).delete(delete_event))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<EventCategory>>, AppError> {
    Ok(Json(state.services.events.list_categories(params.page()).await?))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(category): Json<EventCategory>,
) -> Result<Response, AppError> {
    let category = state.services.events.create_category(category).await?;
    Ok(response::created(category))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(state.services.events.list(params.page()).await?))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(state.services.events.find(id).await?))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<Event>,
) -> Result<Response, AppError> {
    let event = state.services.events.create(event).await?;
    Ok(response::created(event))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.events.delete(id).await?;
    Ok(response::no_content())
}
