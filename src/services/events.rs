use sqlx::{FromRow, PgPool};
use tracing::info;

use super::{refs, Page};
use crate::models::{EntityRef, Event, EventCategory, EventCategoryKey};
use crate::utils::AppError;
use crate::validation::CheckConstraints;

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    name: String,
    description: String,
    category_id: i64,
    category_description: String,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        let mut event = Event::new();
        event.set_id(Some(row.id));
        event.set_name(row.name);
        event.set_description(row.description);
        event.set_category(Some(EntityRef::new(
            Some(row.category_id),
            EventCategoryKey::new(row.category_description),
        )));
        event
    }
}

const SELECT_EVENTS: &str = "SELECT e.id, e.name, e.description, e.category_id, \
     c.description AS category_description \
     FROM events e JOIN event_categories c ON c.id = e.category_id";

/// События и их категории.
#[derive(Clone)]
pub struct EventService {
    pool: PgPool,
}

impl EventService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self, page: Page) -> Result<Vec<EventCategory>, AppError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, description FROM event_categories ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, description)| {
                let mut category = EventCategory::new();
                category.set_id(Some(id));
                category.set_description(description);
                category
            })
            .collect())
    }

    pub async fn create_category(&self, mut category: EventCategory) -> Result<EventCategory, AppError> {
        category.check()?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO event_categories (description) VALUES ($1) RETURNING id",
        )
        .bind(category.description())
        .fetch_one(&self.pool)
        .await?;
        category.set_id(Some(id));
        info!(category_id = id, description = %category.description(), "Event category created");
        Ok(category)
    }

    pub async fn create(&self, mut event: Event) -> Result<Event, AppError> {
        if let Some(category) = event.category() {
            let mut conn = self.pool.acquire().await?;
            let resolved = refs::event_category(&mut conn, category).await?;
            event.set_category(Some(resolved));
        }
        event.check()?;

        let category_id = event.category().and_then(|c| c.id);
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO events (name, description, category_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(event.name())
        .bind(event.description())
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;
        event.set_id(Some(id));

        info!(event_id = id, name = %event.name(), "Event created");
        Ok(event)
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Event>, AppError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "{SELECT_EVENTS} ORDER BY e.id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    pub async fn find(&self, id: i64) -> Result<Event, AppError> {
        let row: Option<EventRow> = sqlx::query_as(&format!("{SELECT_EVENTS} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::from)
            .ok_or_else(|| AppError::not_found(format!("event {id}")))
    }

    /// Deletes an event. Events still staged by a show are kept.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("event {id}")));
        }
        info!(event_id = id, "Event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entity;

    #[test]
    fn row_carries_resolved_category() {
        let event = Event::from(EventRow {
            id: 3,
            name: "Rock concert of the decade".into(),
            description: "Get ready to rock your night away with this megaconcert.".into(),
            category_id: 1,
            category_description: "Concert".into(),
        });

        assert_eq!(event.id(), Some(3));
        let category = event.category().unwrap();
        assert_eq!(category.id, Some(1));
        assert_eq!(category.key.description, "Concert");
        assert!(event.check().is_ok());
    }
}
