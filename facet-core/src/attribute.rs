//! Attribute catalog types
//!
//! The catalog defines the set of dynamically available attribute names
//! and their declared types. Declared types are advisory metadata: values
//! are stored as text and never checked against the type unless a caller
//! opts into [`AttributeType::check_value`] explicitly.

use crate::{EntityId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ATTRIBUTE TYPE
// ============================================================================

/// Declared type of a catalog attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Text,
    Number,
    Date,
    Select,
}

impl AttributeType {
    /// Database string representation (matches the `attributes.type` column).
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AttributeType::Text => "text",
            AttributeType::Number => "number",
            AttributeType::Date => "date",
            AttributeType::Select => "select",
        }
    }

    /// Opt-in typed validation of a raw value string.
    ///
    /// Storage never calls this on its own: the design stores every value
    /// as text regardless of the declared type. Deployments that want
    /// enforcement run this as a separate validation step before writing.
    pub fn check_value(&self, value: &str) -> Result<(), ValidationError> {
        let ok = match self {
            AttributeType::Text | AttributeType::Select => true,
            AttributeType::Number => value.trim().parse::<f64>().is_ok(),
            AttributeType::Date => {
                chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok()
            }
        };

        if ok {
            Ok(())
        } else {
            Err(ValidationError::TypeMismatch {
                declared_type: self.as_db_str().to_string(),
                value: value.to_string(),
            })
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AttributeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(AttributeType::Text),
            "number" => Ok(AttributeType::Number),
            "date" => Ok(AttributeType::Date),
            "select" => Ok(AttributeType::Select),
            _ => Err(ValidationError::InvalidValue {
                field: "type".to_string(),
                reason: format!(
                    "'{}' is not one of: text, number, date, select",
                    s
                ),
            }),
        }
    }
}

// ============================================================================
// CATALOG ENTRY
// ============================================================================

/// A named, typed field definition in the catalog.
///
/// Immutable once created: there is no update or delete operation.
/// Names are NOT required to be unique; the catalog accepts duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Attribute {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Attribute {
    /// Build a new catalog entry with a fresh id.
    ///
    /// Fails if the name is empty or whitespace-only. Uniqueness of the
    /// name is deliberately not checked.
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }

        Ok(Self {
            id: crate::new_entity_id(),
            name,
            attribute_type,
            created_at: chrono::Utc::now(),
        })
    }
}

// ============================================================================
// ATTRIBUTE VALUE
// ============================================================================

/// One stored value of one attribute for one entity.
///
/// The value is kept as text regardless of the attribute's declared type.
/// Multiple rows may exist for the same (entity, attribute) pair; nothing
/// deduplicates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttributeValue {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub attribute_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    pub value: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl AttributeValue {
    /// Build a new value row with a fresh id.
    pub fn new(attribute_id: EntityId, entity_id: EntityId, value: impl Into<String>) -> Self {
        Self {
            id: crate::new_entity_id(),
            attribute_id,
            entity_id,
            value: value.into(),
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_type_round_trip() {
        for s in ["text", "number", "date", "select"] {
            let t: AttributeType = s.parse().unwrap();
            assert_eq!(t.as_db_str(), s);
        }
    }

    #[test]
    fn test_attribute_type_parse_rejects_unknown() {
        assert!("boolean".parse::<AttributeType>().is_err());
        assert!("".parse::<AttributeType>().is_err());
    }

    #[test]
    fn test_attribute_type_parse_is_case_insensitive() {
        assert_eq!("Text".parse::<AttributeType>().unwrap(), AttributeType::Text);
        assert_eq!(" SELECT ".parse::<AttributeType>().unwrap(), AttributeType::Select);
    }

    #[test]
    fn test_check_value_number() {
        assert!(AttributeType::Number.check_value("42").is_ok());
        assert!(AttributeType::Number.check_value("-3.5").is_ok());
        assert!(AttributeType::Number.check_value("IT").is_err());
    }

    #[test]
    fn test_check_value_date() {
        assert!(AttributeType::Date.check_value("2024-02-13").is_ok());
        assert!(AttributeType::Date.check_value("13/02/2024").is_err());
    }

    #[test]
    fn test_check_value_text_accepts_anything() {
        assert!(AttributeType::Text.check_value("").is_ok());
        assert!(AttributeType::Select.check_value("whatever").is_ok());
    }

    #[test]
    fn test_attribute_new_rejects_empty_name() {
        assert!(Attribute::new("", AttributeType::Text).is_err());
        assert!(Attribute::new("   ", AttributeType::Text).is_err());
        assert!(Attribute::new("Department", AttributeType::Text).is_ok());
    }

    #[test]
    fn test_attribute_type_serde_lowercase() {
        let json = serde_json::to_string(&AttributeType::Select).unwrap();
        assert_eq!(json, "\"select\"");
        let parsed: AttributeType = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(parsed, AttributeType::Date);
    }
}
