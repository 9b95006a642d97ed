use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{Entity, EntityRef, ShowKey};
use crate::validation::{CheckConstraints, Violations};

/// Natural key of a [`Performance`]: its show and start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceKey {
    pub show: Option<ShowKey>,
    pub date: Option<DateTime<Utc>>,
}

impl fmt::Display for PerformanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.show {
            Some(show) => write!(f, "{show}")?,
            None => f.write_str("?")?,
        }
        match self.date {
            Some(date) => write!(f, " on {}", date.format("%Y-%m-%d %H:%M")),
            None => Ok(()),
        }
    }
}

/// A single staging of a show at a given date and time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Performance {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[validate(required(message = "must not be null"))]
    date: Option<DateTime<Utc>>,
    /// Owning show. Never serialized.
    #[serde(skip)]
    #[validate(required(message = "must not be null"))]
    show: Option<EntityRef<ShowKey>>,
}

impl Performance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    pub fn set_date(&mut self, date: Option<DateTime<Utc>>) {
        self.date = date;
    }

    pub fn show(&self) -> Option<&EntityRef<ShowKey>> {
        self.show.as_ref()
    }

    pub fn set_show(&mut self, show: Option<EntityRef<ShowKey>>) {
        self.show = show;
    }
}

impl Entity for Performance {
    type Key = PerformanceKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> PerformanceKey {
        PerformanceKey {
            show: self.show.as_ref().map(|s| s.key.clone()),
            date: self.date,
        }
    }
}

natural_identity!(Performance);

impl CheckConstraints for Performance {
    fn violations(&self) -> Violations {
        Violations::from_validation(self.validate())
    }
}
