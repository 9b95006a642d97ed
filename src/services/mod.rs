pub mod allocation;
pub mod bookings;
pub mod events;
pub mod refs;
pub mod shows;
pub mod ticket_categories;
pub mod venues;

use sqlx::PgPool;

use crate::config::Config;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Окно выборки для списков: `OFFSET first LIMIT max_results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(first: Option<i64>, max_results: Option<i64>) -> Self {
        Self {
            offset: first.unwrap_or(0).max(0),
            limit: max_results
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// Все сервисы приложения, каждый держит свой клон пула
#[derive(Clone)]
pub struct Services {
    pub venues: venues::VenueService,
    pub events: events::EventService,
    pub ticket_categories: ticket_categories::TicketCategoryService,
    pub shows: shows::ShowService,
    pub bookings: bookings::BookingService,
}

impl Services {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            venues: venues::VenueService::new(pool.clone()),
            events: events::EventService::new(pool.clone()),
            ticket_categories: ticket_categories::TicketCategoryService::new(pool.clone()),
            shows: shows::ShowService::new(pool.clone()),
            bookings: bookings::BookingService::new(pool, config.booking.contiguous_seats),
        }
    }
}
