use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{EntityRef, SectionKey};

/// A single seat: section, 1-based row and 1-based number within the row.
/// Stored inline with the ticket that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub section: EntityRef<SectionKey>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub row_number: i32,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub number: i32,
}

impl Seat {
    pub fn new(section: EntityRef<SectionKey>, row_number: i32, number: i32) -> Self {
        Self {
            section,
            row_number,
            number,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {} seat {}", self.section, self.row_number, self.number)
    }
}
