use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use validator::Validate;

use super::{Entity, Section};
use crate::validation::{CheckConstraints, Violations};

/// Natural key of a [`Venue`]: its unique name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueKey {
    pub name: String,
}

impl VenueKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for VenueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Postal address, stored inline with the venue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// A place hosting shows; owns its [`Section`]s.
///
/// Sections serialize without their back-reference to the venue, so a venue
/// always serializes as a finite tree. Incoming venues are built through
/// [`Venue::with_sections`], which sees the sections as a list.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[validate(length(min = 1, message = "must not be empty"))]
    name: String,
    address: Address,
    description: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    capacity: i32,
    sections: HashSet<Section>,
}

impl Venue {
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

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn set_address(&mut self, address: Address) {
        self.address = address;
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: i32) {
        self.capacity = capacity;
    }

    pub fn sections(&self) -> &HashSet<Section> {
        &self.sections
    }

    /// Adds a section to the venue. The section's `venue` back-reference is
    /// left as the caller set it.
    pub fn add_section(&mut self, section: Section) -> bool {
        self.sections.insert(section)
    }

    pub fn remove_section(&mut self, section: &Section) -> bool {
        self.sections.remove(section)
    }

    pub fn set_sections(&mut self, sections: HashSet<Section>) {
        self.sections = sections;
    }

    pub fn take_sections(&mut self) -> HashSet<Section> {
        std::mem::take(&mut self.sections)
    }

    /// Points every section's back-reference at this venue.
    ///
    /// Sections read from JSON arrive unlinked, since the link is never
    /// serialized.
    pub fn link_sections(&mut self) {
        let owner = self.to_ref();
        self.sections = self
            .take_sections()
            .into_iter()
            .map(|mut section| {
                section.set_venue(Some(owner.clone()));
                section
            })
            .collect();
    }

    /// Adds sections given as a list, links them and checks the whole venue.
    ///
    /// A section named like an earlier one is a `duplicate` violation.
    pub fn with_sections(mut self, sections: Vec<Section>) -> Result<Venue, Violations> {
        let mut violations = Violations::new();
        for section in sections {
            let path = format!("sections[{}]", section.name());
            if !self.add_section(section) {
                violations.push(path, "duplicate", "section name must be unique within the venue");
            }
        }
        self.link_sections();
        violations.extend(self.violations());
        violations.into_result()?;
        Ok(self)
    }

    /// Sum of the capacities of all sections.
    pub fn seating_capacity(&self) -> i64 {
        self.sections.iter().map(Section::capacity).sum()
    }
}

impl Entity for Venue {
    type Key = VenueKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> VenueKey {
        VenueKey::new(self.name.clone())
    }
}

natural_identity!(Venue);

impl CheckConstraints for Venue {
    fn violations(&self) -> Violations {
        let mut violations = Violations::from_validation(self.validate());
        let owner = self.natural_key();
        for section in &self.sections {
            let path = format!("sections[{}]", section.name());
            violations.nest(&path, section.violations());
            if let Some(venue) = section.venue() {
                if venue.key != owner {
                    violations.push(
                        format!("{path}.venue"),
                        "owner_mismatch",
                        format!("section belongs to venue '{}', not '{}'", venue.key, owner),
                    );
                }
            }
        }
        violations
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, rows: i32, per_row: i32) -> Section {
        let mut section = Section::new();
        section.set_name(name);
        section.set_description(format!("Section {name}"));
        section.set_number_of_rows(rows);
        section.set_row_capacity(per_row);
        section
    }

    #[test]
    fn unlinked_sections_fail_validation() {
        let mut venue = Venue::new();
        venue.set_name("Roy Thomson Hall");
        venue.add_section(section("A", 10, 20));

        let violations = venue.violations();
        assert!(violations.contains_field("sections[A].venue"));

        venue.link_sections();
        assert!(venue.check().is_ok());
    }

    #[test]
    fn sections_linked_to_another_venue_are_rejected() {
        let mut other = Venue::new();
        other.set_name("Sydney Opera House");

        let mut stray = section("B", 1, 1);
        stray.set_venue(Some(other.to_ref()));

        let mut venue = Venue::new();
        venue.set_name("Roy Thomson Hall");
        venue.add_section(stray);

        let violations = venue.check().unwrap_err();
        assert!(violations
            .iter()
            .any(|v| v.field == "sections[B].venue" && v.code == "owner_mismatch"));
    }

    #[test]
    fn seating_capacity_sums_sections() {
        let mut venue = Venue::new();
        venue.set_name("Roy Thomson Hall");
        venue.add_section(section("A", 10, 20));
        venue.add_section(section("B", 5, 4));
        assert_eq!(venue.seating_capacity(), 220);
    }

    #[test]
    fn add_section_refuses_a_taken_name() {
        let mut venue = Venue::new();
        venue.set_name("Roy Thomson Hall");
        venue.add_section(section("A", 10, 20));
        venue.link_sections();

        let mut again = section("A", 1, 1);
        again.set_venue(Some(venue.to_ref()));
        assert!(!venue.add_section(again));
        assert_eq!(venue.sections().len(), 1);
    }

    #[test]
    fn with_sections_reports_repeated_names() {
        let mut venue = Venue::new();
        venue.set_name("Roy Thomson Hall");

        let violations = venue
            .with_sections(vec![section("A", 10, 20), section("B", 2, 2), section("A", 1, 1)])
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        let violation = violations.iter().next().unwrap();
        assert_eq!(violation.field, "sections[A]");
        assert_eq!(violation.code, "duplicate");
    }

    #[test]
    fn with_sections_links_and_keeps_every_section() {
        let mut venue = Venue::new();
        venue.set_name("Roy Thomson Hall");

        let venue = venue
            .with_sections(vec![section("A", 10, 20), section("B", 5, 4)])
            .unwrap();
        assert_eq!(venue.sections().len(), 2);
        assert!(venue.sections().iter().all(|s| s.venue().is_some()));
    }
}
