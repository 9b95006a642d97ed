use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::{BTreeMap, HashMap};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{allocation, Page};
use crate::models::{
    Booking, EntityRef, EventKey, PerformanceKey, Seat, SectionKey, ShowKey, Ticket,
    TicketCategoryKey, VenueKey,
};
use crate::utils::AppError;
use crate::validation::{CheckConstraints, Violations};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    /// Id of the ticket price (show, section and category) being bought.
    pub ticket_price: i64,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i32,
}

/// Входящий запрос на бронирование.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub performance: i64,
    #[validate(email(message = "must be a well-formed email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must request at least one ticket"), nested)]
    pub ticket_requests: Vec<TicketRequest>,
}

#[derive(Debug, FromRow)]
struct PerformanceRow {
    id: i64,
    date: DateTime<Utc>,
    show_id: i64,
    event_name: String,
    venue_name: String,
}

impl PerformanceRow {
    fn venue(&self) -> VenueKey {
        VenueKey::new(self.venue_name.clone())
    }

    fn to_ref(&self) -> EntityRef<PerformanceKey> {
        performance_ref(self.id, self.date, &self.event_name, &self.venue_name)
    }
}

#[derive(Debug, FromRow)]
struct PriceRow {
    id: i64,
    show_id: i64,
    section_id: i64,
    section_name: String,
    number_of_rows: i32,
    row_capacity: i32,
    ticket_category_id: i64,
    category_description: String,
    price: f64,
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: i64,
    cancellation_code: String,
    created_on: DateTime<Utc>,
    contact_email: String,
    performance_id: i64,
    performance_date: DateTime<Utc>,
    event_name: String,
    venue_name: String,
}

#[derive(Debug, FromRow)]
struct TicketRow {
    id: i64,
    booking_id: i64,
    section_id: i64,
    section_name: String,
    row_number: i32,
    seat_number: i32,
    ticket_category_id: i64,
    category_description: String,
    price: f64,
}

#[derive(Debug, FromRow)]
struct BookedSeatRow {
    section_id: i64,
    section_name: String,
    number_of_rows: i32,
    row_capacity: i32,
    row_number: i32,
    seat_number: i32,
}

const SELECT_BOOKINGS: &str = "SELECT b.id, b.cancellation_code, b.created_on, b.contact_email, \
     b.performance_id, p.date AS performance_date, e.name AS event_name, v.name AS venue_name \
     FROM bookings b \
     JOIN performances p ON p.id = b.performance_id \
     JOIN shows s ON s.id = p.show_id \
     JOIN events e ON e.id = s.event_id \
     JOIN venues v ON v.id = s.venue_id";

fn performance_ref(
    id: i64,
    date: DateTime<Utc>,
    event: &str,
    venue: &str,
) -> EntityRef<PerformanceKey> {
    EntityRef::new(
        Some(id),
        PerformanceKey {
            show: Some(ShowKey::new(EventKey::new(event), VenueKey::new(venue))),
            date: Some(date),
        },
    )
}

impl BookingRow {
    fn into_booking(self, tickets: Vec<TicketRow>) -> Booking {
        let venue = VenueKey::new(self.venue_name.clone());

        let mut booking = Booking::new();
        booking.set_id(Some(self.id));
        booking.set_performance(Some(performance_ref(
            self.performance_id,
            self.performance_date,
            &self.event_name,
            &self.venue_name,
        )));
        booking.set_cancellation_code(self.cancellation_code);
        booking.set_created_on(Some(self.created_on));
        booking.set_contact_email(self.contact_email);

        for row in tickets {
            let section = EntityRef::new(
                Some(row.section_id),
                SectionKey::new(Some(venue.clone()), row.section_name),
            );
            let mut ticket = Ticket::new(
                Seat::new(section, row.row_number, row.seat_number),
                EntityRef::new(
                    Some(row.ticket_category_id),
                    TicketCategoryKey::new(row.category_description),
                ),
                row.price,
            );
            ticket.set_id(Some(row.id));
            booking.add_ticket(ticket);
        }
        booking
    }
}

/// Бронирования: выдача мест, сохранение, отмена.
#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
    contiguous: bool,
}

impl BookingService {
    pub fn new(pool: PgPool, contiguous: bool) -> Self {
        Self { pool, contiguous }
    }

    /// Allocates seats for every ticket request and stores the booking, all in
    /// one transaction.
    ///
    /// Requests for the same section are seated as one block. Sections are
    /// locked in id order.
    pub async fn create(&self, request: BookingRequest) -> Result<Booking, AppError> {
        Violations::from_validation(request.validate()).into_result()?;

        let mut tx = self.pool.begin().await?;

        let performance: Option<PerformanceRow> = sqlx::query_as(
            "SELECT p.id, p.date, p.show_id, e.name AS event_name, v.name AS venue_name \
             FROM performances p \
             JOIN shows s ON s.id = p.show_id \
             JOIN events e ON e.id = s.event_id \
             JOIN venues v ON v.id = s.venue_id \
             WHERE p.id = $1",
        )
        .bind(request.performance)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(performance) = performance else {
            let mut violations = Violations::new();
            violations.push(
                "performance",
                "unknown",
                format!("no performance with id {}", request.performance),
            );
            return Err(violations.into());
        };

        let prices = load_prices(&mut tx, &request.ticket_requests).await?;

        // Группируем запросы по секциям, проверяя принадлежность цены шоу
        let mut violations = Violations::new();
        let mut by_section: BTreeMap<i64, Vec<(&TicketRequest, &PriceRow)>> = BTreeMap::new();
        for (index, ticket_request) in request.ticket_requests.iter().enumerate() {
            let field = format!("ticketRequests[{index}].ticketPrice");
            match prices.get(&ticket_request.ticket_price) {
                None => violations.push(
                    field,
                    "unknown",
                    format!("no ticket price with id {}", ticket_request.ticket_price),
                ),
                Some(price) if price.show_id != performance.show_id => violations.push(
                    field,
                    "foreign_price",
                    format!(
                        "ticket price {} is not offered for performance {}",
                        price.id, performance.id
                    ),
                ),
                Some(price) => by_section
                    .entry(price.section_id)
                    .or_default()
                    .push((ticket_request, price)),
            }
        }
        violations.into_result()?;

        let performance_ref = performance.to_ref();
        let venue = performance.venue();
        let mut tickets = Vec::new();

        for (section_id, requests) in &by_section {
            let Some((_, first)) = requests.first() else {
                continue;
            };
            let section = EntityRef::new(
                Some(*section_id),
                SectionKey::new(Some(venue.clone()), first.section_name.clone()),
            );

            let mut grid = allocation::lock(
                &mut tx,
                &performance_ref,
                &section,
                first.number_of_rows,
                first.row_capacity,
            )
            .await?;

            let count = requests
                .iter()
                .map(|(r, _)| usize::try_from(r.quantity).unwrap_or(0))
                .sum();
            let mut seats = grid.allocate_seats(count, self.contiguous)?.into_iter();
            allocation::save(&mut tx, &grid).await?;

            for (ticket_request, price) in requests {
                let category = EntityRef::new(
                    Some(price.ticket_category_id),
                    TicketCategoryKey::new(price.category_description.clone()),
                );
                let quantity = usize::try_from(ticket_request.quantity).unwrap_or(0);
                for seat in seats.by_ref().take(quantity) {
                    tickets.push(Ticket::new(seat, category.clone(), price.price));
                }
            }
        }

        let mut booking = Booking::new();
        booking.set_cancellation_code(Uuid::new_v4().to_string());
        booking.set_created_on(Some(Utc::now()));
        booking.set_contact_email(request.email);
        booking.set_performance(Some(performance_ref));
        booking.set_tickets(tickets);
        booking.check()?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO bookings (cancellation_code, created_on, contact_email, performance_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(booking.cancellation_code())
        .bind(booking.created_on())
        .bind(booking.contact_email())
        .bind(performance.id)
        .fetch_one(&mut *tx)
        .await?;
        booking.set_id(Some(id));

        let mut tickets = booking.tickets().to_vec();
        for ticket in &mut tickets {
            let ticket_id = insert_ticket(&mut tx, id, ticket).await?;
            ticket.set_id(Some(ticket_id));
        }
        booking.set_tickets(tickets);

        tx.commit().await?;

        info!(
            booking_id = id,
            performance_id = performance.id,
            tickets = booking.tickets().len(),
            total = booking.total_ticket_price(),
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Booking>, AppError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "{SELECT_BOOKINGS} ORDER BY b.id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tickets = load_tickets(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let own = tickets.remove(&row.id).unwrap_or_default();
                row.into_booking(own)
            })
            .collect())
    }

    pub async fn find(&self, id: i64) -> Result<Booking, AppError> {
        let row: BookingRow = sqlx::query_as(&format!("{SELECT_BOOKINGS} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("booking {id}")))?;

        let mut tickets = load_tickets(&self.pool, &[id]).await?;
        Ok(row.into_booking(tickets.remove(&id).unwrap_or_default()))
    }

    /// Releases the booking's seats and deletes it with its tickets.
    pub async fn cancel(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let performance_id: i64 =
            sqlx::query_scalar("SELECT performance_id FROM bookings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::not_found(format!("booking {id}")))?;

        let rows: Vec<BookedSeatRow> = sqlx::query_as(
            "SELECT t.section_id, sec.name AS section_name, sec.number_of_rows, sec.row_capacity, \
             t.row_number, t.seat_number \
             FROM tickets t JOIN sections sec ON sec.id = t.section_id \
             WHERE t.booking_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let mut by_section: BTreeMap<i64, Vec<BookedSeatRow>> = BTreeMap::new();
        for row in rows {
            by_section.entry(row.section_id).or_default().push(row);
        }

        let performance = EntityRef::new(Some(performance_id), PerformanceKey::default());
        let mut released = 0usize;
        for (section_id, seats) in &by_section {
            let Some(first) = seats.first() else {
                continue;
            };
            let section = EntityRef::new(
                Some(*section_id),
                SectionKey::new(None, first.section_name.clone()),
            );
            let mut grid = allocation::lock(
                &mut tx,
                &performance,
                &section,
                first.number_of_rows,
                first.row_capacity,
            )
            .await?;
            for row in seats {
                grid.deallocate(&Seat::new(section.clone(), row.row_number, row.seat_number));
                released += 1;
            }
            allocation::save(&mut tx, &grid).await?;
        }

        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(booking_id = id, released, "Booking cancelled");
        Ok(())
    }
}

async fn load_prices(
    conn: &mut PgConnection,
    requests: &[TicketRequest],
) -> Result<HashMap<i64, PriceRow>, AppError> {
    let ids: Vec<i64> = requests.iter().map(|r| r.ticket_price).collect();
    let rows: Vec<PriceRow> = sqlx::query_as(
        "SELECT tp.id, tp.show_id, tp.section_id, sec.name AS section_name, \
         sec.number_of_rows, sec.row_capacity, \
         tp.ticket_category_id, tc.description AS category_description, tp.price \
         FROM ticket_prices tp \
         JOIN sections sec ON sec.id = tp.section_id \
         JOIN ticket_categories tc ON tc.id = tp.ticket_category_id \
         WHERE tp.id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}

async fn insert_ticket(
    conn: &mut PgConnection,
    booking_id: i64,
    ticket: &Ticket,
) -> Result<i64, AppError> {
    let seat = ticket.seat();
    let id = sqlx::query_scalar(
        "INSERT INTO tickets (booking_id, section_id, row_number, seat_number, ticket_category_id, price) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(booking_id)
    .bind(seat.section.id)
    .bind(seat.row_number)
    .bind(seat.number)
    .bind(ticket.ticket_category().and_then(|c| c.id))
    .bind(ticket.price())
    .fetch_one(conn)
    .await?;
    Ok(id)
}

async fn load_tickets(
    pool: &PgPool,
    booking_ids: &[i64],
) -> Result<HashMap<i64, Vec<TicketRow>>, AppError> {
    if booking_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<TicketRow> = sqlx::query_as(
        "SELECT t.id, t.booking_id, t.section_id, sec.name AS section_name, \
         t.row_number, t.seat_number, t.ticket_category_id, \
         tc.description AS category_description, t.price \
         FROM tickets t \
         JOIN sections sec ON sec.id = t.section_id \
         JOIN ticket_categories tc ON tc.id = t.ticket_category_id \
         WHERE t.booking_id = ANY($1) ORDER BY t.id",
    )
    .bind(booking_ids)
    .fetch_all(pool)
    .await?;

    let mut by_booking: HashMap<i64, Vec<TicketRow>> = HashMap::new();
    for row in rows {
        by_booking.entry(row.booking_id).or_default().push(row);
    }
    Ok(by_booking)
}
