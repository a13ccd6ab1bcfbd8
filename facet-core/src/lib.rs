//! Facet Core - Entity-Attribute-Value Data Model
//!
//! Pure data structures and filter semantics for the Facet backend.
//! No I/O lives here: the API crate maps these types onto HTTP and
//! PostgreSQL, while this crate owns the domain rules.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod attribute;
pub mod error;
pub mod filter;
pub mod project;

pub use attribute::{Attribute, AttributeType, AttributeValue};
pub use error::{EntityType, FacetError, FacetResult, StorageError, ValidationError};
pub use filter::AttributeFilter;
pub use project::{Project, ProjectWithValues, ValueWithAttribute};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, so ordering by id is creation order.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_sortable() {
        let a = new_entity_id();
        let b = new_entity_id();
        // UUIDv7 embeds a timestamp, so later ids never sort before earlier ones.
        assert!(a <= b);
    }
}
