use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use super::PageQuery;
use crate::models::{Performance, Show};
use crate::services::shows::ShowRequest;
use crate::utils::{response, AppError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(list_shows).post(create_show))
        .route("/shows/{id}", get(get_show).delete(delete_show))
        .route("/shows/{id}/performances", post(add_performance))
}

pub async fn list_shows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<Show>>, AppError> {
    Ok(Json(state.services.shows.list(params.page()).await?))
}

pub async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Show>, AppError> {
    Ok(Json(state.services.shows.find(id).await?))
}

// Связи детей с шоу восстанавливает сервис после разрешения ссылок
pub async fn create_show(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ShowRequest>,
) -> Result<Response, AppError> {
    let show = state.services.shows.create(request).await?;
    Ok(response::created(show))
}

pub async fn delete_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.shows.delete(id).await?;
    Ok(response::no_content())
}

pub async fn add_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(performance): Json<Performance>,
) -> Result<Response, AppError> {
    let performance = state.services.shows.add_performance(id, performance).await?;
    Ok(response::created(performance))
}
