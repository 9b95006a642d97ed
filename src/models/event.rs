use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{Entity, EntityRef};
use crate::validation::{CheckConstraints, Violations};

/// Natural key of an [`EventCategory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EventCategoryKey {
    pub description: String,
}

impl EventCategoryKey {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl fmt::Display for EventCategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Kind of event, e.g. "Concert" or "Theatre".
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EventCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[validate(length(min = 1, message = "must not be empty"))]
    description: String,
}

impl EventCategory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
}

impl Entity for EventCategory {
    type Key = EventCategoryKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> EventCategoryKey {
        EventCategoryKey::new(self.description.clone())
    }
}

natural_identity!(EventCategory);

impl CheckConstraints for EventCategory {
    fn violations(&self) -> Violations {
        Violations::from_validation(self.validate())
    }
}

/// Natural key of an [`Event`]: its unique name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EventKey {
    pub name: String,
}

impl EventKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Something people buy tickets for. Staged at venues through [`super::Show`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[validate(length(
        min = 5,
        max = 50,
        message = "must be between 5 and 50 characters"
    ))]
    name: String,
    #[validate(length(
        min = 20,
        max = 1000,
        message = "must be between 20 and 1000 characters"
    ))]
    description: String,
    #[validate(required(message = "must not be null"))]
    category: Option<EntityRef<EventCategoryKey>>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn category(&self) -> Option<&EntityRef<EventCategoryKey>> {
        self.category.as_ref()
    }

    pub fn set_category(&mut self, category: Option<EntityRef<EventCategoryKey>>) {
        self.category = category;
    }
}

impl Entity for Event {
    type Key = EventKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> EventKey {
        EventKey::new(self.name.clone())
    }
}

natural_identity!(Event);

impl CheckConstraints for Event {
    fn violations(&self) -> Violations {
        Violations::from_validation(self.validate())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_description_lengths_are_bounded() {
        let mut event = Event::new();
        event.set_name("Rock");
        event.set_description("Too short");
        event.set_category(Some(EntityRef::transient(EventCategoryKey::new("Concert"))));

        let violations = event.check().unwrap_err();
        assert!(violations.contains_field("name"));
        assert!(violations.contains_field("description"));

        event.set_name("Rock concert of the decade");
        event.set_description("Get ready to rock your night away with this megaconcert.");
        assert!(event.check().is_ok());
    }

    #[test]
    fn category_is_required() {
        let mut event = Event::new();
        event.set_name("Shane's Sock Puppets");
        event.set_description("This critically acclaimed masterpiece will take you on a journey.");
        assert!(event.check().unwrap_err().contains_field("category"));
    }

    #[test]
    fn events_compare_by_name() {
        let mut a = Event::new();
        a.set_id(Some(1));
        a.set_name("Rock concert of the decade");
        let mut b = a.clone();
        b.set_id(Some(2));
        b.set_description("A different description entirely, long enough.");
        assert_eq!(a, b);
    }
}
