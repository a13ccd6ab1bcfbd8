//! Request/Response Types for the Facet API
//!
//! Thin DTOs for the HTTP surface. Persisted shapes live in facet-core;
//! these types only describe what goes over the wire.

use facet_core::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// ATTRIBUTE CATALOG
// ============================================================================

/// Request body for POST /api/v1/attributes.
///
/// The type arrives as a raw string so that an unknown type surfaces as a
/// 400 ValidationFailed instead of a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAttributeRequest {
    pub name: String,
    /// One of: text, number, date, select
    #[serde(rename = "type")]
    pub attribute_type: String,
}

// ============================================================================
// ATTRIBUTE VALUES
// ============================================================================

/// Request body for POST /api/v1/projects/:id/attributes.
/// The entity id comes from the path, not the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAttributeValueRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub attribute_id: EntityId,
    pub value: String,
}

// ============================================================================
// PROJECTS
// ============================================================================

/// Request body for POST /api/v1/projects.
///
/// `attributes` is an optional inline map of attribute id to value,
/// written in the same transaction as the project row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub attributes: Option<BTreeMap<Uuid, String>>,
}

// ============================================================================
// AUTH
// ============================================================================

/// Request body for POST /api/v1/auth/register.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Request body for POST /api/v1/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token issued by register/login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    pub token: String,
}

/// Public view of a user account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserProfile {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Response body for POST /api/v1/auth/register.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub token: String,
}
