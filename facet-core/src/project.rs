//! Project entity
//!
//! The core business object attributes attach to. Projects carry a fixed
//! schema (name plus an optional free-form status) and own their
//! attribute-value rows: deleting a project cascades to its values as an
//! explicit store operation.

use crate::{Attribute, AttributeValue, EntityId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};

/// A project record with its fixed core fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Project {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Project {
    /// Build a new project with a fresh id.
    ///
    /// Fails if the name is empty or whitespace-only.
    pub fn new(
        name: impl Into<String>,
        status: Option<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }

        Ok(Self {
            id: crate::new_entity_id(),
            name,
            status,
            created_at: chrono::Utc::now(),
        })
    }
}

/// A project joined with its attribute-value rows and their catalog entries.
///
/// This is the eager-join shape the listing endpoints return so that
/// clients never pay an extra round trip per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProjectWithValues {
    #[serde(flatten)]
    pub project: Project,
    pub values: Vec<ValueWithAttribute>,
}

/// One value row paired with the catalog entry it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValueWithAttribute {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub attribute: Attribute,
    pub value: String,
}

impl ValueWithAttribute {
    /// Pair a stored value row with its catalog entry.
    pub fn from_parts(row: &AttributeValue, attribute: Attribute) -> Self {
        Self {
            id: row.id,
            attribute,
            value: row.value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeType;

    #[test]
    fn test_project_new_rejects_empty_name() {
        assert!(Project::new("", None).is_err());
        assert!(Project::new("  ", Some("active".to_string())).is_err());
    }

    #[test]
    fn test_project_new_keeps_optional_status() {
        let p = Project::new("ProjectX", Some("active".to_string())).unwrap();
        assert_eq!(p.status.as_deref(), Some("active"));

        let p = Project::new("ProjectY", None).unwrap();
        assert!(p.status.is_none());
    }

    #[test]
    fn test_project_serializes_without_null_status() {
        let p = Project::new("ProjectX", None).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_value_with_attribute_from_parts() {
        let attr = Attribute::new("Department", AttributeType::Text).unwrap();
        let row = AttributeValue::new(attr.id, crate::new_entity_id(), "IT");
        let joined = ValueWithAttribute::from_parts(&row, attr.clone());
        assert_eq!(joined.id, row.id);
        assert_eq!(joined.attribute, attr);
        assert_eq!(joined.value, "IT");
    }
}
