use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::Entity;
use crate::validation::{CheckConstraints, Violations};

/// Natural key of a [`TicketCategory`]: its unique description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketCategoryKey {
    pub description: String,
}

impl TicketCategoryKey {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl fmt::Display for TicketCategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Kind of ticket, e.g. "Adult" or "Child".
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TicketCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[validate(length(min = 1, message = "must not be empty"))]
    description: String,
}

impl TicketCategory {
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

impl Entity for TicketCategory {
    type Key = TicketCategoryKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> TicketCategoryKey {
        TicketCategoryKey::new(self.description.clone())
    }
}

natural_identity!(TicketCategory);

impl CheckConstraints for TicketCategory {
    fn violations(&self) -> Violations {
        Violations::from_validation(self.validate())
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TicketCategory")?;
        if !self.description.trim().is_empty() {
            write!(f, " description: {}", self.description)?;
        }
        Ok(())
    }
}
