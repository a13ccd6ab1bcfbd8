//! Conjunctive attribute filter
//!
//! Answers "which entities match attribute X = value Y AND attribute Z =
//! value W ...". The matching law is conjunction-of-existence: an entity
//! matches iff for EVERY predicate there exists at least one of its value
//! rows satisfying that predicate. Each predicate may be satisfied by a
//! different row; this is NOT a single-row multi-column match.
//!
//! The API layer compiles the same law to SQL (one EXISTS semi-join per
//! predicate). This module is the executable reference for that law and
//! what the tests exercise.

use crate::{AttributeValue, EntityId, Project};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of (attribute id, expected value) predicates combined with AND.
///
/// Comparison is exact string equality, case-sensitive. Declared attribute
/// types are never consulted. The BTreeMap keeps predicate order (and thus
/// generated SQL) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct AttributeFilter {
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    predicates: BTreeMap<EntityId, String>,
}

impl AttributeFilter {
    /// Empty filter; matches every entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate. A second predicate for the same attribute replaces
    /// the first (one expected value per attribute id).
    pub fn insert(&mut self, attribute_id: EntityId, expected: impl Into<String>) {
        self.predicates.insert(attribute_id, expected.into());
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, attribute_id: EntityId, expected: impl Into<String>) -> Self {
        self.insert(attribute_id, expected);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Predicates in attribute-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &str)> {
        self.predicates.iter().map(|(id, v)| (id, v.as_str()))
    }

    /// Check one entity's value rows against every predicate.
    ///
    /// `values` must be the rows owned by a single entity. Rows for other
    /// entities would make a predicate look satisfied when it is not, so
    /// callers group rows by entity first (see [`AttributeFilter::apply`]).
    pub fn matches(&self, values: &[AttributeValue]) -> bool {
        self.predicates.iter().all(|(attribute_id, expected)| {
            values
                .iter()
                .any(|row| row.attribute_id == *attribute_id && row.value == *expected)
        })
    }

    /// Apply the filter to a set of projects and their value rows.
    ///
    /// Returns matching projects ordered by id ascending (ids are UUIDv7,
    /// so this is creation order). The source design left ordering
    /// unspecified; Facet makes it deterministic.
    pub fn apply<'a>(
        &self,
        projects: &'a [Project],
        values: &[AttributeValue],
    ) -> Vec<&'a Project> {
        let mut by_entity: BTreeMap<EntityId, Vec<&AttributeValue>> = BTreeMap::new();
        for row in values {
            by_entity.entry(row.entity_id).or_default().push(row);
        }

        let mut matched: Vec<&Project> = projects
            .iter()
            .filter(|p| {
                let rows = by_entity.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
                self.predicates.iter().all(|(attribute_id, expected)| {
                    rows.iter()
                        .any(|row| row.attribute_id == *attribute_id && row.value == *expected)
                })
            })
            .collect();

        matched.sort_by_key(|p| p.id);
        matched
    }
}

impl FromIterator<(EntityId, String)> for AttributeFilter {
    fn from_iter<I: IntoIterator<Item = (EntityId, String)>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}
