//! Доменная модель TicketMonster.
//!
//! Every entity compares and hashes by its natural key (the business attributes that
//! identify it), never by the surrogate `id`. Associations that do not own their
//! target are carried as [`EntityRef`]s: the target's surrogate id, if known, plus
//! its natural key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Implements `PartialEq`, `Eq` and `Hash` through [`Entity::natural_key`].
macro_rules! natural_identity {
    ($($entity:ty),+ $(,)?) => {$(
        impl PartialEq for $entity {
            fn eq(&self, other: &Self) -> bool {
                $crate::models::Entity::natural_key(self) == $crate::models::Entity::natural_key(other)
            }
        }

        impl Eq for $entity {}

        impl std::hash::Hash for $entity {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&$crate::models::Entity::natural_key(self), state);
            }
        }
    )+};
}

pub mod booking;
pub mod event;
pub mod performance;
pub mod seat;
pub mod section;
pub mod section_allocation;
pub mod show;
pub mod ticket;
pub mod ticket_category;
pub mod ticket_price;
pub mod venue;

pub use booking::{Booking, BookingKey};
pub use event::{Event, EventCategory, EventCategoryKey, EventKey};
pub use performance::{Performance, PerformanceKey};
pub use seat::Seat;
pub use section::{Section, SectionKey, MAX_ROWS, MAX_ROW_CAPACITY};
pub use section_allocation::{AllocationError, SectionAllocation};
pub use show::{Show, ShowKey};
pub use ticket::Ticket;
pub use ticket_category::{TicketCategory, TicketCategoryKey};
pub use ticket_price::{TicketPrice, TicketPriceKey};
pub use venue::{Address, Venue, VenueKey};

/// A persistent entity with a generated surrogate id and a natural key.
pub trait Entity {
    type Key: Clone + Eq + Hash + fmt::Debug;

    /// Surrogate id, `None` until the entity is first persisted.
    fn id(&self) -> Option<i64>;

    fn natural_key(&self) -> Self::Key;

    /// Non-owning reference to this entity, used for back-references and
    /// many-to-one associations.
    fn to_ref(&self) -> EntityRef<Self::Key> {
        EntityRef {
            id: self.id(),
            key: self.natural_key(),
        }
    }
}

/// Reference to another entity by surrogate id and natural key.
///
/// Two references are equal when their keys are equal; the id is only a
/// lookup hint for the storage layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRef<K> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub key: K,
}

impl<K> EntityRef<K> {
    pub fn new(id: Option<i64>, key: K) -> Self {
        Self { id, key }
    }

    /// Reference to an entity that has not been persisted yet.
    pub fn transient(key: K) -> Self {
        Self { id: None, key }
    }
}

impl<K: PartialEq> PartialEq for EntityRef<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq> Eq for EntityRef<K> {}

impl<K: Hash> Hash for EntityRef<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<K: fmt::Display> fmt::Display for EntityRef<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn refs_compare_by_key_only() {
        let a = EntityRef::new(Some(1), VenueKey::new("Roy Thomson Hall"));
        let b = EntityRef::new(Some(42), VenueKey::new("Roy Thomson Hall"));
        let c = EntityRef::transient(VenueKey::new("Roy Thomson Hall"));
        assert_eq!(a, b);
        assert_eq!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn ref_serializes_key_inline() {
        let r = EntityRef::new(Some(7), VenueKey::new("Sydney Opera House"));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({"id": 7, "name": "Sydney Opera House"}));

        let transient = EntityRef::transient(VenueKey::new("Sydney Opera House"));
        let json = serde_json::to_value(&transient).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn ref_deserializes_from_id_only() {
        let r: EntityRef<VenueKey> = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(r.id, Some(3));
        assert!(r.key.name.is_empty());
    }
}
