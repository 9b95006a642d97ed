use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, EntityRef, Seat, TicketCategoryKey};
use crate::validation::{CheckConstraints, Violations};

/// One admission to one seat, owned by a [`super::Booking`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    seat: Seat,
    #[validate(required(message = "must not be null"))]
    ticket_category: Option<EntityRef<TicketCategoryKey>>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    price: f64,
}

impl Ticket {
    pub fn new(seat: Seat, ticket_category: EntityRef<TicketCategoryKey>, price: f64) -> Self {
        Self {
            id: None,
            seat,
            ticket_category: Some(ticket_category),
            price,
        }
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn seat(&self) -> &Seat {
        &self.seat
    }

    pub fn ticket_category(&self) -> Option<&EntityRef<TicketCategoryKey>> {
        self.ticket_category.as_ref()
    }

    pub fn set_ticket_category(&mut self, ticket_category: Option<EntityRef<TicketCategoryKey>>) {
        self.ticket_category = ticket_category;
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn set_price(&mut self, price: f64) {
        self.price = price;
    }
}

impl Entity for Ticket {
    type Key = Seat;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> Seat {
        self.seat.clone()
    }
}

natural_identity!(Ticket);

impl CheckConstraints for Ticket {
    fn violations(&self) -> Violations {
        let mut violations = Violations::from_validation(self.validate());
        violations.nest("seat", Violations::from_validation(self.seat.validate()));
        violations
    }
}
