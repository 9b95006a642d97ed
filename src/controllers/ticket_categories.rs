use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get},
    Json, Router,
};
use std::sync::Arc;

use super::PageQuery;
use crate::models::TicketCategory;
use crate::utils::{response, AppError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ticket-categories", get(list_categories).post(create_category))
        .route("/ticket-categories/{id}", delete(delete_category))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<TicketCategory>>, AppError> {
    Ok(Json(state.services.ticket_categories.list(params.page()).await?))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(category): Json<TicketCategory>,
) -> Result<Response, AppError> {
    let category = state.services.ticket_categories.create(category).await?;
    Ok(response::created(category))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.ticket_categories.delete(id).await?;
    Ok(response::no_content())
}
