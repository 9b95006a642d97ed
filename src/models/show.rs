use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use validator::Validate;

use super::{Entity, EntityRef, EventKey, Performance, TicketPrice, VenueKey};
use crate::validation::{CheckConstraints, Violations};

/// Natural key of a [`Show`]: the event and the venue staging it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowKey {
    pub event: Option<EventKey>,
    pub venue: Option<VenueKey>,
}

impl ShowKey {
    pub fn new(event: EventKey, venue: VenueKey) -> Self {
        Self {
            event: Some(event),
            venue: Some(venue),
        }
    }
}

impl fmt::Display for ShowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = self.event.as_ref().map_or("?", |e| e.name.as_str());
        let venue = self.venue.as_ref().map_or("?", |v| v.name.as_str());
        write!(f, "{event} at {venue}")
    }
}

/// An event staged at a venue. Aggregate root for its [`Performance`]s and
/// [`TicketPrice`]s: both are loaded with the show, serialized with it and
/// deleted with it.
///
/// Performances serialize in date order, ticket prices by section and category.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[validate(required(message = "must not be null"))]
    event: Option<EntityRef<EventKey>>,
    #[validate(required(message = "must not be null"))]
    venue: Option<EntityRef<VenueKey>>,
    #[serde(serialize_with = "performances_by_date")]
    performances: HashSet<Performance>,
    #[serde(serialize_with = "ticket_prices_by_section")]
    ticket_prices: HashSet<TicketPrice>,
}

impl Show {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn event(&self) -> Option<&EntityRef<EventKey>> {
        self.event.as_ref()
    }

    pub fn set_event(&mut self, event: Option<EntityRef<EventKey>>) {
        self.event = event;
    }

    pub fn venue(&self) -> Option<&EntityRef<VenueKey>> {
        self.venue.as_ref()
    }

    pub fn set_venue(&mut self, venue: Option<EntityRef<VenueKey>>) {
        self.venue = venue;
    }

    pub fn performances(&self) -> &HashSet<Performance> {
        &self.performances
    }

    /// Adds a performance. Its `show` back-reference is left as the caller set it.
    pub fn add_performance(&mut self, performance: Performance) -> bool {
        self.performances.insert(performance)
    }

    pub fn take_performances(&mut self) -> HashSet<Performance> {
        std::mem::take(&mut self.performances)
    }

    pub fn ticket_prices(&self) -> &HashSet<TicketPrice> {
        &self.ticket_prices
    }

    /// Adds a ticket price. Its `show` back-reference is left as the caller set it.
    pub fn add_ticket_price(&mut self, ticket_price: TicketPrice) -> bool {
        self.ticket_prices.insert(ticket_price)
    }

    pub fn take_ticket_prices(&mut self) -> HashSet<TicketPrice> {
        std::mem::take(&mut self.ticket_prices)
    }

    /// Adds children given as lists, links them and checks the whole show.
    ///
    /// References inside the ticket prices must be resolved first: prices are
    /// told apart by section and category keys. A child whose key repeats an
    /// earlier one is a `duplicate` violation.
    pub fn with_children(
        mut self,
        performances: Vec<Performance>,
        ticket_prices: Vec<TicketPrice>,
    ) -> Result<Show, Violations> {
        let mut violations = Violations::new();
        for performance in performances {
            let path = performance_path(&performance);
            if !self.add_performance(performance) {
                violations.push(path, "duplicate", "show already has a performance at this date");
            }
        }
        for ticket_price in ticket_prices {
            let path = ticket_price_path(&ticket_price);
            if !self.add_ticket_price(ticket_price) {
                violations.push(
                    path,
                    "duplicate",
                    "show already has a price for this section and ticket category",
                );
            }
        }
        self.link_children();
        violations.extend(self.violations());
        violations.into_result()?;
        Ok(self)
    }

    /// Points the back-reference of every performance and ticket price at this show.
    pub fn link_children(&mut self) {
        let owner = self.to_ref();
        self.performances = self
            .take_performances()
            .into_iter()
            .map(|mut performance| {
                performance.set_show(Some(owner.clone()));
                performance
            })
            .collect();
        self.ticket_prices = self
            .take_ticket_prices()
            .into_iter()
            .map(|mut ticket_price| {
                ticket_price.set_show(Some(owner.clone()));
                ticket_price
            })
            .collect();
    }
}

impl Entity for Show {
    type Key = ShowKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> ShowKey {
        ShowKey {
            event: self.event.as_ref().map(|e| e.key.clone()),
            venue: self.venue.as_ref().map(|v| v.key.clone()),
        }
    }
}

natural_identity!(Show);

impl CheckConstraints for Show {
    fn violations(&self) -> Violations {
        let mut violations = Violations::from_validation(self.validate());
        let owner = self.natural_key();

        for performance in &self.performances {
            let path = performance_path(performance);
            violations.nest(&path, performance.violations());
            check_owner(&mut violations, &path, performance.show(), &owner);
        }

        for ticket_price in &self.ticket_prices {
            let path = ticket_price_path(ticket_price);
            violations.nest(&path, ticket_price.violations());
            check_owner(&mut violations, &path, ticket_price.show(), &owner);

            // Секция цены должна принадлежать площадке шоу.
            if let (Some(section), Some(venue)) = (ticket_price.section(), owner.venue.as_ref()) {
                if section.key.venue.as_ref().is_some_and(|v| v != venue) {
                    violations.push(
                        format!("{path}.section"),
                        "foreign_section",
                        format!("section '{}' is not part of venue '{venue}'", section.key),
                    );
                }
            }
        }

        violations
    }
}

fn performance_path(performance: &Performance) -> String {
    match performance.date() {
        Some(date) => format!("performances[{}]", date.to_rfc3339()),
        None => "performances[?]".to_string(),
    }
}

fn ticket_price_path(ticket_price: &TicketPrice) -> String {
    let (section, category) = price_order(ticket_price);
    format!("ticketPrices[{section}/{category}]")
}

fn price_order(ticket_price: &TicketPrice) -> (&str, &str) {
    (
        ticket_price.section().map_or("?", |s| s.key.name.as_str()),
        ticket_price
            .ticket_category()
            .map_or("?", |c| c.key.description.as_str()),
    )
}

fn performances_by_date<S: Serializer>(
    performances: &HashSet<Performance>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut sorted: Vec<&Performance> = performances.iter().collect();
    sorted.sort_by_key(|performance| performance.date());
    serializer.collect_seq(sorted)
}

fn ticket_prices_by_section<S: Serializer>(
    ticket_prices: &HashSet<TicketPrice>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut sorted: Vec<&TicketPrice> = ticket_prices.iter().collect();
    sorted.sort_by(|a, b| price_order(a).cmp(&price_order(b)));
    serializer.collect_seq(sorted)
}

fn check_owner(
    violations: &mut Violations,
    path: &str,
    show: Option<&EntityRef<ShowKey>>,
    owner: &ShowKey,
) {
    if let Some(show) = show {
        if &show.key != owner {
            violations.push(
                format!("{path}.show"),
                "owner_mismatch",
                format!("belongs to show '{}', not '{owner}'", show.key),
            );
        }
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.natural_key().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SectionKey, TicketCategoryKey};
    use chrono::{TimeZone, Utc};

    fn show() -> Show {
        let mut show = Show::new();
        show.set_event(Some(EntityRef::transient(EventKey::new("Rock concert of the decade"))));
        show.set_venue(Some(EntityRef::transient(VenueKey::new("Roy Thomson Hall"))));
        show
    }

    fn performance(day: u32) -> Performance {
        let mut performance = Performance::new();
        performance.set_date(Some(Utc.with_ymd_and_hms(2027, 4, day, 19, 30, 0).unwrap()));
        performance
    }

    #[test]
    fn display_is_event_at_venue() {
        assert_eq!(show().to_string(), "Rock concert of the decade at Roy Thomson Hall");
    }

    #[test]
    fn event_and_venue_are_required() {
        let violations = Show::new().check().unwrap_err();
        assert!(violations.contains_field("event"));
        assert!(violations.contains_field("venue"));
    }

    #[test]
    fn children_must_be_linked_before_persisting() {
        let mut show = show();
        show.add_performance(performance(1));
        show.add_performance(performance(2));

        let violations = show.check().unwrap_err();
        assert_eq!(
            violations.iter().filter(|v| v.field.ends_with(".show")).count(),
            2
        );

        show.link_children();
        assert!(show.check().is_ok());
    }

    #[test]
    fn ticket_price_section_must_be_in_the_show_venue() {
        let mut show = show();
        let mut ticket_price = TicketPrice::new();
        ticket_price.set_section(Some(EntityRef::transient(SectionKey::new(
            Some(VenueKey::new("Sydney Opera House")),
            "S1",
        ))));
        ticket_price.set_ticket_category(Some(EntityRef::transient(TicketCategoryKey::new(
            "Adult",
        ))));
        ticket_price.set_price(100.0);
        show.add_ticket_price(ticket_price);
        show.link_children();

        let violations = show.check().unwrap_err();
        assert!(violations
            .iter()
            .any(|v| v.code == "foreign_section" && v.field == "ticketPrices[S1/Adult].section"));
    }

    fn price(section: Option<i64>, category: Option<i64>) -> TicketPrice {
        let mut ticket_price = TicketPrice::new();
        ticket_price.set_section(Some(EntityRef::new(section, SectionKey::default())));
        ticket_price.set_ticket_category(Some(EntityRef::new(category, TicketCategoryKey::default())));
        ticket_price.set_price(50.0);
        ticket_price
    }

    fn resolved(ticket_price: &mut TicketPrice, section: &str, category: &str) {
        let venue = VenueKey::new("Roy Thomson Hall");
        let section_id = ticket_price.section().and_then(|s| s.id);
        let category_id = ticket_price.ticket_category().and_then(|c| c.id);
        ticket_price.set_section(Some(EntityRef::new(section_id, SectionKey::new(Some(venue), section))));
        ticket_price.set_ticket_category(Some(EntityRef::new(
            category_id,
            TicketCategoryKey::new(category),
        )));
    }

    #[test]
    fn prices_referenced_by_id_are_kept_once_resolved() {
        let mut prices = vec![price(Some(1), Some(1)), price(Some(1), Some(2)), price(Some(2), Some(1))];
        resolved(&mut prices[0], "A", "Adult");
        resolved(&mut prices[1], "A", "Child");
        resolved(&mut prices[2], "B", "Adult");

        let show = show().with_children(vec![performance(1)], prices).unwrap();
        assert_eq!(show.ticket_prices().len(), 3);
    }

    #[test]
    fn repeated_price_is_reported_not_dropped() {
        let mut prices = vec![price(Some(1), Some(1)), price(Some(1), Some(1))];
        resolved(&mut prices[0], "A", "Adult");
        resolved(&mut prices[1], "A", "Adult");

        let violations = show().with_children(Vec::new(), prices).unwrap_err();
        assert!(violations
            .iter()
            .any(|v| v.code == "duplicate" && v.field == "ticketPrices[A/Adult]"));
    }

    #[test]
    fn repeated_performance_date_is_reported() {
        let violations = show()
            .with_children(vec![performance(3), performance(3)], Vec::new())
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.iter().next().unwrap().code, "duplicate");
    }

    #[test]
    fn performances_serialize_in_date_order() {
        let days = [5, 7, 4, 3, 1, 2, 8, 6];
        let show = show()
            .with_children(days.iter().map(|day| performance(*day)).collect(), Vec::new())
            .unwrap();

        let json = serde_json::to_value(&show).unwrap();
        let dates: Vec<_> = json["performances"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["date"].as_str().unwrap().to_string())
            .collect();
        let mut expected = dates.clone();
        expected.sort();
        assert_eq!(dates, expected);
        assert_eq!(dates.len(), days.len());
    }

    #[test]
    fn serialized_show_carries_children_without_back_references() {
        let mut show = show();
        show.set_id(Some(1));
        show.add_performance(performance(1));
        show.link_children();

        let json = serde_json::to_value(&show).unwrap();
        assert_eq!(json["event"]["name"], "Rock concert of the decade");
        assert_eq!(json["venue"]["name"], "Roy Thomson Hall");
        let performances = json["performances"].as_array().unwrap();
        assert_eq!(performances.len(), 1);
        assert!(performances[0].get("show").is_none());
        assert_eq!(json["ticketPrices"].as_array().unwrap().len(), 0);
    }
}
