use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{Entity, EntityRef, SectionKey, ShowKey, TicketCategoryKey};
use crate::validation::{CheckConstraints, Violations};

/// Natural key of a [`TicketPrice`]: one price per show, section and category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TicketPriceKey {
    pub show: Option<ShowKey>,
    pub section: Option<SectionKey>,
    pub ticket_category: Option<TicketCategoryKey>,
}

/// Price of one ticket category in one section for a show.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketPrice {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    /// Owning show. Never serialized.
    #[serde(skip)]
    #[validate(required(message = "must not be null"))]
    show: Option<EntityRef<ShowKey>>,
    #[validate(required(message = "must not be null"))]
    section: Option<EntityRef<SectionKey>>,
    #[validate(required(message = "must not be null"))]
    ticket_category: Option<EntityRef<TicketCategoryKey>>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    price: f64,
}

impl TicketPrice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn show(&self) -> Option<&EntityRef<ShowKey>> {
        self.show.as_ref()
    }

    pub fn set_show(&mut self, show: Option<EntityRef<ShowKey>>) {
        self.show = show;
    }

    pub fn section(&self) -> Option<&EntityRef<SectionKey>> {
        self.section.as_ref()
    }

    pub fn set_section(&mut self, section: Option<EntityRef<SectionKey>>) {
        self.section = section;
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

impl Entity for TicketPrice {
    type Key = TicketPriceKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> TicketPriceKey {
        TicketPriceKey {
            show: self.show.as_ref().map(|r| r.key.clone()),
            section: self.section.as_ref().map(|r| r.key.clone()),
            ticket_category: self.ticket_category.as_ref().map(|r| r.key.clone()),
        }
    }
}

natural_identity!(TicketPrice);

impl CheckConstraints for TicketPrice {
    fn violations(&self) -> Violations {
        Violations::from_validation(self.validate())
    }
}

impl fmt::Display for TicketPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$ {:.2}", self.price)?;
        if let Some(category) = &self.ticket_category {
            write!(f, " for {category}")?;
        }
        if let Some(section) = &self.section {
            write!(f, " in {section}")?;
        }
        Ok(())
    }
}
