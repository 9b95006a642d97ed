use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use tracing::info;

use super::{refs, Page};
use crate::models::{
    Entity, EntityRef, EventKey, Performance, SectionKey, Show, TicketCategoryKey, TicketPrice,
    VenueKey,
};
use crate::utils::AppError;
use crate::validation::CheckConstraints;

/// Тело `POST /shows`.
///
/// Children arrive as lists. Ticket prices may name their section and
/// category by id only, so they can be compared only after resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShowRequest {
    pub event: Option<EntityRef<EventKey>>,
    pub venue: Option<EntityRef<VenueKey>>,
    pub performances: Vec<Performance>,
    pub ticket_prices: Vec<TicketPrice>,
}

#[derive(Debug, FromRow)]
struct ShowRow {
    id: i64,
    event_id: i64,
    event_name: String,
    venue_id: i64,
    venue_name: String,
}

#[derive(Debug, FromRow)]
struct PerformanceRow {
    id: i64,
    show_id: i64,
    date: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct TicketPriceRow {
    id: i64,
    show_id: i64,
    section_id: i64,
    section_name: String,
    ticket_category_id: i64,
    category_description: String,
    price: f64,
}

const SELECT_SHOWS: &str = "SELECT s.id, s.event_id, e.name AS event_name, \
     s.venue_id, v.name AS venue_name \
     FROM shows s \
     JOIN events e ON e.id = s.event_id \
     JOIN venues v ON v.id = s.venue_id";

impl ShowRow {
    fn into_show(self, performances: Vec<PerformanceRow>, prices: Vec<TicketPriceRow>) -> Show {
        let venue = VenueKey::new(self.venue_name);

        let mut show = Show::new();
        show.set_id(Some(self.id));
        show.set_event(Some(EntityRef::new(Some(self.event_id), EventKey::new(self.event_name))));
        show.set_venue(Some(EntityRef::new(Some(self.venue_id), venue.clone())));

        for row in performances {
            let mut performance = Performance::new();
            performance.set_id(Some(row.id));
            performance.set_date(Some(row.date));
            show.add_performance(performance);
        }

        for row in prices {
            let mut price = TicketPrice::new();
            price.set_id(Some(row.id));
            price.set_section(Some(EntityRef::new(
                Some(row.section_id),
                SectionKey::new(Some(venue.clone()), row.section_name),
            )));
            price.set_ticket_category(Some(EntityRef::new(
                Some(row.ticket_category_id),
                TicketCategoryKey::new(row.category_description),
            )));
            price.set_price(row.price);
            show.add_ticket_price(price);
        }

        show.link_children();
        show
    }
}

/// Шоу вместе с представлениями и ценами.
#[derive(Clone)]
pub struct ShowService {
    pool: PgPool,
}

impl ShowService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists a show with its performances and ticket prices in one
    /// transaction, then returns it as stored.
    pub async fn create(&self, request: ShowRequest) -> Result<Show, AppError> {
        let mut tx = self.pool.begin().await?;

        let show = resolve(&mut tx, request).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO shows (event_id, venue_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(show.event().and_then(|e| e.id))
        .bind(show.venue().and_then(|v| v.id))
        .fetch_one(&mut *tx)
        .await?;

        for performance in show.performances() {
            sqlx::query("INSERT INTO performances (date, show_id) VALUES ($1, $2)")
                .bind(performance.date())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        for price in show.ticket_prices() {
            sqlx::query(
                "INSERT INTO ticket_prices (show_id, section_id, ticket_category_id, price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(price.section().and_then(|s| s.id))
            .bind(price.ticket_category().and_then(|c| c.id))
            .bind(price.price())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            show_id = id,
            show = %show,
            performances = show.performances().len(),
            ticket_prices = show.ticket_prices().len(),
            "Show created"
        );
        self.find(id).await
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Show>, AppError> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "{SELECT_SHOWS} ORDER BY s.id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let (mut performances, mut prices) = load_children(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let own_performances = performances.remove(&row.id).unwrap_or_default();
                let own_prices = prices.remove(&row.id).unwrap_or_default();
                row.into_show(own_performances, own_prices)
            })
            .collect())
    }

    pub async fn find(&self, id: i64) -> Result<Show, AppError> {
        let row: ShowRow = sqlx::query_as(&format!("{SELECT_SHOWS} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("show {id}")))?;

        let (mut performances, mut prices) = load_children(&self.pool, &[id]).await?;
        Ok(row.into_show(
            performances.remove(&id).unwrap_or_default(),
            prices.remove(&id).unwrap_or_default(),
        ))
    }

    /// Deletes a show with its performances and prices. Shows with booked
    /// performances are kept.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM shows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("show {id}")));
        }
        info!(show_id = id, "Show deleted");
        Ok(())
    }

    /// Adds one performance to an existing show.
    pub async fn add_performance(
        &self,
        show_id: i64,
        mut performance: Performance,
    ) -> Result<Performance, AppError> {
        let show = self.find(show_id).await?;
        performance.set_show(Some(show.to_ref()));
        performance.check()?;

        if show.performances().contains(&performance) {
            return Err(AppError::UniqueViolation {
                constraint: "performances_date_show_key".to_string(),
            });
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO performances (date, show_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(performance.date())
        .bind(show_id)
        .fetch_one(&self.pool)
        .await?;
        performance.set_id(Some(id));

        info!(show_id, performance_id = id, "Performance added");
        Ok(performance)
    }
}

/// Resolves the event, the venue and every price's section and category,
/// then assembles and checks the show.
async fn resolve(conn: &mut PgConnection, request: ShowRequest) -> Result<Show, AppError> {
    let ShowRequest {
        event,
        venue,
        performances,
        mut ticket_prices,
    } = request;

    let mut show = Show::new();
    if let Some(event) = event {
        show.set_event(Some(refs::event(conn, &event).await?));
    }
    if let Some(venue) = venue {
        show.set_venue(Some(refs::venue(conn, &venue).await?));
    }

    let venue = show.venue().map(|v| v.key.clone()).unwrap_or_default();
    for price in &mut ticket_prices {
        if let Some(section) = price.section() {
            let resolved = refs::section(conn, section, &venue).await?;
            price.set_section(Some(resolved));
        }
        if let Some(category) = price.ticket_category() {
            let resolved = refs::ticket_category(conn, category).await?;
            price.set_ticket_category(Some(resolved));
        }
    }

    Ok(show.with_children(performances, ticket_prices)?)
}

async fn load_children(
    pool: &PgPool,
    show_ids: &[i64],
) -> Result<(HashMap<i64, Vec<PerformanceRow>>, HashMap<i64, Vec<TicketPriceRow>>), AppError> {
    let mut performances: HashMap<i64, Vec<PerformanceRow>> = HashMap::new();
    let mut prices: HashMap<i64, Vec<TicketPriceRow>> = HashMap::new();
    if show_ids.is_empty() {
        return Ok((performances, prices));
    }

    let rows: Vec<PerformanceRow> = sqlx::query_as(
        "SELECT id, show_id, date FROM performances WHERE show_id = ANY($1) ORDER BY date",
    )
    .bind(show_ids)
    .fetch_all(pool)
    .await?;
    for row in rows {
        performances.entry(row.show_id).or_default().push(row);
    }

    let rows: Vec<TicketPriceRow> = sqlx::query_as(
        "SELECT tp.id, tp.show_id, tp.section_id, sec.name AS section_name, \
         tp.ticket_category_id, tc.description AS category_description, tp.price \
         FROM ticket_prices tp \
         JOIN sections sec ON sec.id = tp.section_id \
         JOIN ticket_categories tc ON tc.id = tp.ticket_category_id \
         WHERE tp.show_id = ANY($1) ORDER BY tp.id",
    )
    .bind(show_ids)
    .fetch_all(pool)
    .await?;
    for row in rows {
        prices.entry(row.show_id).or_default().push(row);
    }

    Ok((performances, prices))
}
