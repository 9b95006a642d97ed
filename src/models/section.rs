use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{Entity, EntityRef, VenueKey};
use crate::validation::{CheckConstraints, Violations};

/// Most rows a section may have. The allocation grid of a section is stored
/// whole, so its size is bounded.
pub const MAX_ROWS: i32 = 500;
/// Most seats a row may have.
pub const MAX_ROW_CAPACITY: i32 = 500;

/// Natural key of a [`Section`]: its name, unique within the venue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<VenueKey>,
    pub name: String,
}

impl SectionKey {
    pub fn new(venue: Option<VenueKey>, name: impl Into<String>) -> Self {
        Self {
            venue,
            name: name.into(),
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A block of seats inside a venue, laid out as `number_of_rows` rows of
/// `row_capacity` seats.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct Section {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    /// Short name, e.g. "A" or "Balcony".
    #[validate(length(min = 1, message = "must not be empty"))]
    name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    description: String,
    #[validate(range(min = 0, max = 500, message = "must be between 0 and 500"))]
    number_of_rows: i32,
    #[validate(range(min = 0, max = 500, message = "must be between 0 and 500"))]
    row_capacity: i32,
    /// Owning venue. Never serialized.
    #[serde(skip)]
    #[validate(required(message = "must not be null"))]
    venue: Option<EntityRef<VenueKey>>,
}

impl Section {
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

    pub fn number_of_rows(&self) -> i32 {
        self.number_of_rows
    }

    pub fn set_number_of_rows(&mut self, number_of_rows: i32) {
        self.number_of_rows = number_of_rows;
    }

    pub fn row_capacity(&self) -> i32 {
        self.row_capacity
    }

    pub fn set_row_capacity(&mut self, row_capacity: i32) {
        self.row_capacity = row_capacity;
    }

    pub fn venue(&self) -> Option<&EntityRef<VenueKey>> {
        self.venue.as_ref()
    }

    pub fn set_venue(&mut self, venue: Option<EntityRef<VenueKey>>) {
        self.venue = venue;
    }

    /// Total number of seats. Derived, not stored.
    pub fn capacity(&self) -> i64 {
        i64::from(self.row_capacity) * i64::from(self.number_of_rows)
    }
}

impl Entity for Section {
    type Key = SectionKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> SectionKey {
        SectionKey::new(self.venue.as_ref().map(|v| v.key.clone()), self.name.clone())
    }
}

natural_identity!(Section);

impl CheckConstraints for Section {
    fn violations(&self) -> Violations {
        Violations::from_validation(self.validate())
    }
}
