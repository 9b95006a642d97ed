//! Разрешение ссылок на сущности.
//!
//! A reference coming from a client carries either the surrogate id, the natural
//! key, or both. The id wins when present. The resolved reference always carries
//! both, as stored.

use sqlx::PgConnection;

use crate::models::{
    EntityRef, EventCategoryKey, EventKey, SectionKey, TicketCategoryKey, VenueKey,
};
use crate::utils::AppError;

fn unknown(kind: &str, reference: impl std::fmt::Display, id: Option<i64>) -> AppError {
    match id {
        Some(id) => AppError::ReferentialIntegrity(format!("unknown {kind} with id {id}")),
        None => AppError::ReferentialIntegrity(format!("unknown {kind} '{reference}'")),
    }
}

/// Surrogate id of a reference that must already be resolved.
pub fn persisted_id<K: std::fmt::Display>(reference: &EntityRef<K>) -> Result<i64, AppError> {
    reference
        .id
        .ok_or_else(|| AppError::ReferentialIntegrity(format!("'{reference}' is not persisted")))
}

pub async fn venue(
    conn: &mut PgConnection,
    reference: &EntityRef<VenueKey>,
) -> Result<EntityRef<VenueKey>, AppError> {
    let row: Option<(i64, String)> = match reference.id {
        Some(id) => {
            sqlx::query_as("SELECT id, name FROM venues WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id, name FROM venues WHERE name = $1")
                .bind(&reference.key.name)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    row.map(|(id, name)| EntityRef::new(Some(id), VenueKey::new(name)))
        .ok_or_else(|| unknown("venue", reference, reference.id))
}

pub async fn event_category(
    conn: &mut PgConnection,
    reference: &EntityRef<EventCategoryKey>,
) -> Result<EntityRef<EventCategoryKey>, AppError> {
    let row: Option<(i64, String)> = match reference.id {
        Some(id) => {
            sqlx::query_as("SELECT id, description FROM event_categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id, description FROM event_categories WHERE description = $1")
                .bind(&reference.key.description)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    row.map(|(id, description)| EntityRef::new(Some(id), EventCategoryKey::new(description)))
        .ok_or_else(|| unknown("event category", reference, reference.id))
}

pub async fn event(
    conn: &mut PgConnection,
    reference: &EntityRef<EventKey>,
) -> Result<EntityRef<EventKey>, AppError> {
    let row: Option<(i64, String)> = match reference.id {
        Some(id) => {
            sqlx::query_as("SELECT id, name FROM events WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id, name FROM events WHERE name = $1")
                .bind(&reference.key.name)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    row.map(|(id, name)| EntityRef::new(Some(id), EventKey::new(name)))
        .ok_or_else(|| unknown("event", reference, reference.id))
}

pub async fn ticket_category(
    conn: &mut PgConnection,
    reference: &EntityRef<TicketCategoryKey>,
) -> Result<EntityRef<TicketCategoryKey>, AppError> {
    let row: Option<(i64, String)> = match reference.id {
        Some(id) => {
            sqlx::query_as("SELECT id, description FROM ticket_categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id, description FROM ticket_categories WHERE description = $1")
                .bind(&reference.key.description)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    row.map(|(id, description)| EntityRef::new(Some(id), TicketCategoryKey::new(description)))
        .ok_or_else(|| unknown("ticket category", reference, reference.id))
}

/// Resolves a section reference. A reference by name is looked up in the
/// venue named by its key, or in `default_venue` when the key names none.
pub async fn section(
    conn: &mut PgConnection,
    reference: &EntityRef<SectionKey>,
    default_venue: &VenueKey,
) -> Result<EntityRef<SectionKey>, AppError> {
    let row: Option<(i64, String, String)> = match reference.id {
        Some(id) => {
            sqlx::query_as(
                "SELECT s.id, s.name, v.name FROM sections s \
                 JOIN venues v ON v.id = s.venue_id \
                 WHERE s.id = $1",
            )
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        }
        None => {
            let venue = reference.key.venue.as_ref().unwrap_or(default_venue);
            sqlx::query_as(
                "SELECT s.id, s.name, v.name FROM sections s \
                 JOIN venues v ON v.id = s.venue_id \
                 WHERE s.name = $1 AND v.name = $2",
            )
            .bind(&reference.key.name)
            .bind(&venue.name)
            .fetch_optional(&mut *conn)
            .await?
        }
    };

    row.map(|(id, name, venue)| {
        EntityRef::new(Some(id), SectionKey::new(Some(VenueKey::new(venue)), name))
    })
    .ok_or_else(|| unknown("section", reference, reference.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn unpersisted_refs_have_no_id() {
        let reference = EntityRef::transient(VenueKey::new("Roy Thomson Hall"));
        let err = persisted_id(&reference).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let reference = EntityRef::new(Some(4), VenueKey::new("Roy Thomson Hall"));
        assert_eq!(persisted_id(&reference).unwrap(), 4);
    }

    #[test]
    fn unknown_reference_names_the_lookup() {
        let err = unknown("venue", VenueKey::new("Nowhere"), None);
        assert!(err.to_string().contains("unknown venue 'Nowhere'"));
        let err = unknown("venue", VenueKey::new(""), Some(9));
        assert!(err.to_string().contains("id 9"));
    }
}
