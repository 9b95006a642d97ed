use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use validator::Validate;

use super::{Entity, EntityRef, PerformanceKey, Ticket};
use crate::validation::{CheckConstraints, Violations};

/// Natural key of a [`Booking`]: its unique cancellation code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingKey {
    pub cancellation_code: String,
}

impl fmt::Display for BookingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cancellation_code)
    }
}

/// A purchase of tickets for one performance. Owns its tickets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct Booking {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[validate(length(min = 1, message = "must not be empty"))]
    cancellation_code: String,
    #[validate(required(message = "must not be null"))]
    created_on: Option<DateTime<Utc>>,
    #[validate(email(message = "must be a well-formed email address"))]
    contact_email: String,
    #[validate(required(message = "must not be null"))]
    performance: Option<EntityRef<PerformanceKey>>,
    tickets: Vec<Ticket>,
}

impl Booking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn cancellation_code(&self) -> &str {
        &self.cancellation_code
    }

    pub fn set_cancellation_code(&mut self, cancellation_code: impl Into<String>) {
        self.cancellation_code = cancellation_code.into();
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        self.created_on
    }

    pub fn set_created_on(&mut self, created_on: Option<DateTime<Utc>>) {
        self.created_on = created_on;
    }

    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    pub fn set_contact_email(&mut self, contact_email: impl Into<String>) {
        self.contact_email = contact_email.into();
    }

    pub fn performance(&self) -> Option<&EntityRef<PerformanceKey>> {
        self.performance.as_ref()
    }

    pub fn set_performance(&mut self, performance: Option<EntityRef<PerformanceKey>>) {
        self.performance = performance;
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn add_ticket(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
    }

    pub fn set_tickets(&mut self, tickets: Vec<Ticket>) {
        self.tickets = tickets;
    }

    pub fn total_ticket_price(&self) -> f64 {
        self.tickets.iter().map(Ticket::price).sum()
    }
}

impl Entity for Booking {
    type Key = BookingKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> BookingKey {
        BookingKey {
            cancellation_code: self.cancellation_code.clone(),
        }
    }
}

natural_identity!(Booking);

impl CheckConstraints for Booking {
    fn violations(&self) -> Violations {
        let mut violations = Violations::from_validation(self.validate());
        let mut seen = HashSet::new();
        for (index, ticket) in self.tickets.iter().enumerate() {
            let path = format!("tickets[{index}]");
            violations.nest(&path, ticket.violations());
            if !seen.insert(ticket.seat()) {
                violations.push(
                    format!("{path}.seat"),
                    "duplicate_seat",
                    format!("{} is booked twice", ticket.seat()),
                );
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Seat, SectionKey, TicketCategoryKey};

    fn ticket(row: i32, number: i32, price: f64) -> Ticket {
        Ticket::new(
            Seat::new(EntityRef::new(Some(1), SectionKey::new(None, "A")), row, number),
            EntityRef::new(Some(1), TicketCategoryKey::new("Adult")),
            price,
        )
    }

    fn booking() -> Booking {
        let mut booking = Booking::new();
        booking.set_cancellation_code("c0ffee");
        booking.set_created_on(Some(Utc::now()));
        booking.set_contact_email("bob@acme.com");
        booking.set_performance(Some(EntityRef::new(Some(1), PerformanceKey::default())));
        booking
    }

    #[test]
    fn total_is_the_sum_of_ticket_prices() {
        let mut booking = booking();
        booking.add_ticket(ticket(1, 1, 167.75));
        booking.add_ticket(ticket(1, 2, 167.75));
        booking.add_ticket(ticket(1, 3, 97.75));
        assert!((booking.total_ticket_price() - 433.25).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut booking = booking();
        booking.set_contact_email("not-an-email");
        let violations = booking.check().unwrap_err();
        assert!(violations.iter().any(|v| v.code == "email"));

        booking.set_contact_email("");
        let violations = booking.check().unwrap_err();
        assert!(violations.iter().any(|v| v.code == "email"));
    }

    #[test]
    fn the_same_seat_cannot_be_booked_twice() {
        let mut booking = booking();
        booking.add_ticket(ticket(2, 5, 10.0));
        booking.add_ticket(ticket(2, 5, 10.0));

        let violations = booking.check().unwrap_err();
        assert!(violations
            .iter()
            .any(|v| v.field == "tickets[1].seat" && v.code == "duplicate_seat"));
    }

    #[test]
    fn seat_numbers_start_at_one() {
        let mut booking = booking();
        booking.add_ticket(ticket(0, 0, 10.0));

        let violations = booking.check().unwrap_err();
        assert_eq!(
            violations
                .iter()
                .filter(|v| v.field.starts_with("tickets[0].seat.") && v.code == "range")
                .count(),
            2
        );
    }

    #[test]
    fn bookings_compare_by_cancellation_code() {
        let mut a = booking();
        a.set_id(Some(1));
        let mut b = booking();
        b.set_id(Some(2));
        b.set_contact_email("alice@acme.com");
        assert_eq!(a, b);
    }
}
