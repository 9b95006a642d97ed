use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use tracing::info;

use super::Page;
use crate::models::{Address, Section, Venue};
use crate::utils::AppError;

/// Тело `POST /venues`: секции приходят списком.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VenueRequest {
    pub name: String,
    pub address: Address,
    pub description: Option<String>,
    pub capacity: i32,
    pub sections: Vec<Section>,
}

impl VenueRequest {
    /// Builds the venue and checks it with all of its sections.
    pub fn into_venue(self) -> Result<Venue, AppError> {
        let mut venue = Venue::new();
        venue.set_name(self.name);
        venue.set_address(self.address);
        venue.set_description(self.description);
        venue.set_capacity(self.capacity);
        Ok(venue.with_sections(self.sections)?)
    }
}

#[derive(Debug, FromRow)]
struct VenueRow {
    id: i64,
    name: String,
    street: Option<String>,
    city: Option<String>,
    country: Option<String>,
    description: Option<String>,
    capacity: i32,
}

#[derive(Debug, FromRow)]
struct SectionRow {
    id: i64,
    venue_id: i64,
    name: String,
    description: String,
    number_of_rows: i32,
    row_capacity: i32,
}

impl VenueRow {
    fn into_venue(self, sections: Vec<SectionRow>) -> Venue {
        let mut venue = Venue::new();
        venue.set_id(Some(self.id));
        venue.set_name(self.name);
        venue.set_address(Address {
            street: self.street,
            city: self.city,
            country: self.country,
        });
        venue.set_description(self.description);
        venue.set_capacity(self.capacity);
        for row in sections {
            let mut section = Section::new();
            section.set_id(Some(row.id));
            section.set_name(row.name);
            section.set_description(row.description);
            section.set_number_of_rows(row.number_of_rows);
            section.set_row_capacity(row.row_capacity);
            venue.add_section(section);
        }
        venue.link_sections();
        venue
    }
}

#[derive(Clone)]
pub struct VenueService {
    pool: PgPool,
}

impl VenueService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists a venue together with its sections.
    pub async fn create(&self, request: VenueRequest) -> Result<Venue, AppError> {
        let mut venue = request.into_venue()?;

        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO venues (name, street, city, country, description, capacity) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(venue.name())
        .bind(&venue.address().street)
        .bind(&venue.address().city)
        .bind(&venue.address().country)
        .bind(venue.description())
        .bind(venue.capacity())
        .fetch_one(&mut *tx)
        .await?;
        venue.set_id(Some(id));

        let mut sections = Vec::with_capacity(venue.sections().len());
        for mut section in venue.take_sections() {
            let section_id = insert_section(&mut tx, id, &section).await?;
            section.set_id(Some(section_id));
            sections.push(section);
        }
        venue.set_sections(sections.into_iter().collect());
        venue.link_sections();

        tx.commit().await?;

        info!(venue_id = id, name = %venue.name(), sections = venue.sections().len(), "Venue created");
        Ok(venue)
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Venue>, AppError> {
        let rows: Vec<VenueRow> = sqlx::query_as(
            "SELECT id, name, street, city, country, description, capacity \
             FROM venues ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut sections = load_sections(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let own = sections.remove(&row.id).unwrap_or_default();
                row.into_venue(own)
            })
            .collect())
    }

    pub async fn find(&self, id: i64) -> Result<Venue, AppError> {
        let row: VenueRow = sqlx::query_as(
            "SELECT id, name, street, city, country, description, capacity \
             FROM venues WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("venue {id}")))?;

        let mut sections = load_sections(&self.pool, &[id]).await?;
        Ok(row.into_venue(sections.remove(&id).unwrap_or_default()))
    }

    /// Deletes a venue and its sections. Venues still staging shows are kept.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("venue {id}")));
        }
        info!(venue_id = id, "Venue deleted");
        Ok(())
    }
}

async fn insert_section(
    conn: &mut PgConnection,
    venue_id: i64,
    section: &Section,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar(
        "INSERT INTO sections (name, description, number_of_rows, row_capacity, venue_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(section.name())
    .bind(section.description())
    .bind(section.number_of_rows())
    .bind(section.row_capacity())
    .bind(venue_id)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

async fn load_sections(
    pool: &PgPool,
    venue_ids: &[i64],
) -> Result<HashMap<i64, Vec<SectionRow>>, AppError> {
    if venue_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<SectionRow> = sqlx::query_as(
        "SELECT id, venue_id, name, description, number_of_rows, row_capacity \
         FROM sections WHERE venue_id = ANY($1) ORDER BY id",
    )
    .bind(venue_ids)
    .fetch_all(pool)
    .await?;

    let mut by_venue: HashMap<i64, Vec<SectionRow>> = HashMap::new();
    for row in rows {
        by_venue.entry(row.venue_id).or_default().push(row);
    }
    Ok(by_venue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entity;
    use crate::validation::CheckConstraints;

    fn section_row(id: i64, name: &str) -> SectionRow {
        SectionRow {
            id,
            venue_id: 1,
            name: name.to_string(),
            description: format!("Section {name}"),
            number_of_rows: 10,
            row_capacity: 20,
        }
    }

    #[test]
    fn request_with_a_repeated_section_name_is_rejected() {
        let request: VenueRequest = serde_json::from_value(serde_json::json!({
            "name": "Roy Thomson Hall",
            "sections": [
                { "name": "A", "description": "Premier platinum reserve", "numberOfRows": 2, "rowCapacity": 4 },
                { "name": "A", "description": "Balcony", "numberOfRows": 1, "rowCapacity": 2 }
            ]
        }))
        .unwrap();
        assert_eq!(request.sections.len(), 2);

        match request.into_venue() {
            Err(AppError::Validation(violations)) => {
                assert!(violations
                    .iter()
                    .any(|v| v.field == "sections[A]" && v.code == "duplicate"));
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn loaded_sections_point_back_to_their_venue() {
        let row = VenueRow {
            id: 1,
            name: "Roy Thomson Hall".into(),
            street: Some("60 Simcoe Street".into()),
            city: Some("Toronto".into()),
            country: Some("Canada".into()),
            description: None,
            capacity: 2000,
        };
        let venue = row.into_venue(vec![section_row(10, "A"), section_row(11, "B")]);

        assert_eq!(venue.sections().len(), 2);
        assert!(venue
            .sections()
            .iter()
            .all(|s| s.venue().is_some_and(|v| v.id == Some(1) && v.key == venue.natural_key())));
        assert!(venue.check().is_ok());
        assert_eq!(venue.address().city.as_deref(), Some("Toronto"));
    }
}
