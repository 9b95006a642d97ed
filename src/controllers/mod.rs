pub mod bookings;
pub mod events;
pub mod shows;
pub mod ticket_categories;
pub mod venues;

use axum::Router;
use serde::Deserialize;
use std::sync::Arc;

use crate::services::Page;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(venues::routes())
        .merge(events::routes())
        .merge(ticket_categories::routes())
        .merge(shows::routes())
        .merge(bookings::routes())
}

/// `?first=&maxResults=` у всех списков.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub first: Option<i64>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.first, self.max_results)
    }
}
