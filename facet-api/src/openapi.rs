//! OpenAPI Specification
//!
//! Defines the OpenAPI document for the Facet REST API. utoipa generates
//! the specification from Rust types and route annotations.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::types::{
    CreateAttributeRequest, CreateAttributeValueRequest, CreateProjectRequest, LoginRequest,
    RegisterRequest, RegisterResponse, TokenResponse, UserProfile,
};

// Import route modules for path references
use crate::routes::{attribute, auth, health, project};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};

// Import domain types from facet-core
use facet_core::{
    Attribute, AttributeType, AttributeValue, Project, ProjectWithValues, ValueWithAttribute,
};

/// OpenAPI document for the Facet API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Facet API",
        version = "0.1.0",
        description = "Project management backend with an open-ended typed attribute system",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Attributes", description = "Attribute catalog management"),
        (name = "Projects", description = "Project CRUD, attribute values, and filtering"),
        (name = "Auth", description = "Registration and login"),
        (name = "Health", description = "Service health probes")
    ),
    paths(
        // === Attribute Routes ===
        attribute::create_attribute,
        attribute::list_attributes,

        // === Project Routes ===
        project::create_project,
        project::list_projects,
        project::filter_projects,
        project::get_project,
        project::set_attribute_value,
        project::delete_project,

        // === Auth Routes ===
        auth::register,
        auth::login,

        // === Health Routes ===
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Request/Response Types ===
            CreateAttributeRequest, CreateAttributeValueRequest, CreateProjectRequest,
            RegisterRequest, LoginRequest, TokenResponse, UserProfile, RegisterResponse,

            // === Health Types ===
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth,

            // === Core Domain Types (from facet-core) ===
            Attribute, AttributeType, AttributeValue,
            Project, ProjectWithValues, ValueWithAttribute
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Facet API");
        assert!(!doc.paths.paths.is_empty());
    }

    #[test]
    fn test_openapi_serializes_to_json() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/v1/projects/filter"));
        assert!(json.contains("bearer_auth"));
    }
}
